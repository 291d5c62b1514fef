use crate::error::HttpAppError;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use tessera_core::AppError;

/// Response for a handler panic caught by `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    HttpAppError(AppError::Internal(format!("Handler panicked: {}", message))).into_response()
}
