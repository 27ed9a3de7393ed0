use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sp_provider::ProviderError;
use thiserror::Error;
use tracing::warn;

/// A failed API request.  Rendered as a status code plus a plain-text reason;
/// stations only look at the status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("request worker failed: {0}")]
    Worker(String),
}

impl ApiError {
    pub(crate) fn bad_request(reason: impl Into<String>) -> Self {
        ApiError::BadRequest(reason.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(ProviderError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Provider(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "request failed");
        (status, self.to_string()).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
