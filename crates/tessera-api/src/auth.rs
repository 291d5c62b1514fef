//! Shared-key gate for the upload route.
//!
//! When an upload key is configured, clients present it as `Authorization: Bearer <key>`
//! or `X-API-Key: <key>`.

use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tessera_core::AppError;

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct UploadAuthState {
    pub api_key: String,
}

/// Constant-time string comparison to prevent timing attacks on key validation.
fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn presented_key(request: &Request) -> Result<&str, &'static str> {
    let headers = request.headers();
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| "Invalid authorization header format")?;
        return value
            .strip_prefix("Bearer ")
            .ok_or("Invalid authorization header format");
    }
    headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or("Missing authorization header")
}

pub async fn upload_auth_middleware(
    State(auth_state): State<Arc<UploadAuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let verdict =
        presented_key(&request).map(|key| secure_compare(key.trim(), &auth_state.api_key));

    match verdict {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::warn!(path = %request.uri().path(), "Rejected upload with invalid API key");
            HttpAppError(AppError::Unauthorized("Invalid API key".to_string())).into_response()
        }
        Err(reason) => {
            tracing::debug!(
                path = %request.uri().path(),
                reason,
                "Rejected unauthenticated upload"
            );
            HttpAppError(AppError::Unauthorized(reason.to_string())).into_response()
        }
    }
}
