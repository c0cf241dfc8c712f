mod error;
pub mod models;
mod router;
mod server;
pub mod services;
pub mod state;

pub use error::{ServeError, X_CASCADE};
pub use router::serve_path;
pub use server::run;
pub use state::AppState;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use services::{health, serve};

/// HTTP application: `/health` plus every mounted instance
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(serve)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
