use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::LoginResponse;
use crate::github::client::UpstreamError;

/// Failures a handler can surface to the caller.
///
/// Nothing here is recovered locally: every variant maps directly to an HTTP
/// response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required secret is absent from the process configuration.
    #[error("{0} not set")]
    MissingConfig(&'static str),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// Admin credentials did not match.
    #[error("invalid credentials")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(err) => err.status(),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Unauthorized => {
                (status, Json(LoginResponse { success: false })).into_response()
            }
            ApiError::Upstream(err) => {
                tracing::warn!(status = status.as_u16(), error = %err, "upstream call failed");
                (status, err.to_string()).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
