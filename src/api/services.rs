use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

use super::{error::ServeError, models::HealthResponse, router::serve_path, state::AppState};
use crate::content::Content;

/// Fallback handler: offer the path to each mounted instance in turn
pub async fn serve(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return ServeError::MethodNotAllowed.into_response();
    }

    let path = uri.path();
    for instance in state.mount_order() {
        match serve_path(&instance, path).await {
            Err(ServeError::Cascade) => continue,
            Err(e) => return e.into_response(),
            Ok(content) => {
                let max_age = instance.settings().cache_duration_secs;
                return render(content, max_age, method == Method::HEAD);
            }
        }
    }

    tracing::debug!(path, "No instance mounted at path");
    ServeError::Cascade.into_response()
}

fn render(content: Content, max_age: u64, head: bool) -> Response {
    let headers = [
        (header::CONTENT_TYPE, content.content_type().to_string()),
        (header::CACHE_CONTROL, format!("public, max-age={max_age}")),
        (header::CONTENT_LENGTH, content.len().to_string()),
    ];

    if head {
        (StatusCode::OK, headers).into_response()
    } else {
        (StatusCode::OK, headers, content.data).into_response()
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let instances = state
        .registry
        .instances()
        .into_iter()
        .map(|instance| (instance.name().to_string(), instance.metrics().snapshot()))
        .collect();

    let response = HealthResponse {
        status: "healthy".to_string(),
        instances,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
