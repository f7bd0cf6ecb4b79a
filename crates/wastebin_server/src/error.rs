//! HTTP error mapping for engine errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use wastebin_core::AppError;

/// Engine error carried to an axum response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidName(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StorageUnavailable(_) | AppError::IndexInconsistency(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self.0 {
            AppError::NotFound => "Not found".to_string(),
            AppError::InvalidName(_) => self.0.to_string(),
            AppError::Conflict(ref msg) => {
                tracing::warn!("Write conflict persisted after retries: {}", msg);
                "Storage busy, retry later".to_string()
            }
            AppError::StorageUnavailable(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                "Storage error".to_string()
            }
            AppError::IndexInconsistency(ref msg) => {
                tracing::error!("Index inconsistency: {}", msg);
                "Storage error".to_string()
            }
        };
        (status, message).into_response()
    }
}
