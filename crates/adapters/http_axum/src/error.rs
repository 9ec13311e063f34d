//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use bizhub_domain::error::{BizHubError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BizHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(BizHubError);

impl From<BizHubError> for ApiError {
    fn from(err: BizHubError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BizHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            BizHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            BizHubError::Storage(err) | BizHubError::External(err) => {
                tracing::error!(error = %err, kind = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
