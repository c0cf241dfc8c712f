use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::job::JobError;

/// Header telling an outer router to try its next handler
pub const X_CASCADE: &str = "x-cascade";

/// Terminal outcome of a request that did not produce content
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("path is not mounted here")]
    Cascade,
    #[error("not found")]
    NotFound,
    #[error("bad request")]
    BadRequest,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl ServeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServeError::Cascade | ServeError::NotFound => StatusCode::NOT_FOUND,
            ServeError::BadRequest => StatusCode::BAD_REQUEST,
            ServeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Fixed body; internal detail only ever goes to the logs
    pub fn body(&self) -> &'static str {
        match self {
            ServeError::Cascade | ServeError::NotFound => "Not found",
            ServeError::BadRequest => "Bad request",
            ServeError::Internal(_) => "Internal server error",
            ServeError::MethodNotAllowed => "Method not allowed",
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain")],
            self.body(),
        )
            .into_response();

        match self {
            ServeError::Cascade => {
                response
                    .headers_mut()
                    .insert(X_CASCADE, HeaderValue::from_static("pass"));
            }
            ServeError::MethodNotAllowed => {
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            }
            _ => {}
        }

        response
    }
}

impl From<JobError> for ServeError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(_)
            | JobError::UnknownOperation(_)
            | JobError::InvalidArguments { .. }
            | JobError::InvalidSequence { .. } => ServeError::NotFound,
            JobError::Backend(message) => ServeError::Internal(message),
        }
    }
}
