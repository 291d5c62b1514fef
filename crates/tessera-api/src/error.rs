//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Every error renders as the upload protocol's
//! `responseType: "error"` body with the status from the error's metadata.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tessera_core::{AppError, ErrorBody, ErrorMetadata, LogLevel, UploadResponse};
use tessera_storage::StorageError;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from tessera-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::WriteFailed(msg) | StorageError::DirectoryError(msg) => {
                AppError::ChunkWrite(msg)
            }
            StorageError::ReadFailed(msg) | StorageError::DeleteFailed(msg) => {
                AppError::Internal(msg)
            }
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

/// Build the protocol error body for `error`.
pub fn error_body(error: &AppError, is_production: bool) -> ErrorBody {
    let hide_details = is_production && error.is_sensitive();
    ErrorBody {
        success: false,
        error: error.client_message(),
        details: if hide_details { None } else { error.details() },
        file: error.file().map(String::from),
        code: error.error_code().to_string(),
        status: error.http_status_code(),
        recoverable: error.is_recoverable(),
        suggested_action: error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = UploadResponse::Error(error_body(app_error, is_production_env()));
        (status, Json(body)).into_response()
    }
}
