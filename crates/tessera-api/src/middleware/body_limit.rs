use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tessera_core::AppError;

/// Replace the plain-text 413 of `RequestBodyLimitLayer` with the protocol error body.
///
/// Responses that already carry JSON (the handler's own size checks) pass through untouched.
pub async fn body_limit_middleware(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json(&response) {
        return response;
    }
    HttpAppError(AppError::RequestTooLarge { limit }).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
