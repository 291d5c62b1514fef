//! HTTP client for the Tessera chunked upload API.
//!
//! Provides a minimal client with optional auth (Bearer token or X-API-Key) and
//! [`ChunkUploader`], which splits a file into hashed chunks and sends them in order.
//! The CLI uses this client directly.

pub mod error;
pub mod progress;
pub mod uploader;

pub use error::TransportError;
pub use progress::{ProgressCallback, UploadProgress};
pub use uploader::{ChunkUploader, UploadOptions, UploadedFile};

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::multipart::Form;
use reqwest::Client;
use std::time::Duration;
use tessera_core::protocol::UPLOAD_ROUTE;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// HTTP client for the Tessera API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Option<Auth>,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Option<Auth>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from environment: TESSERA_API_URL (or API_URL), TESSERA_API_KEY (or API_KEY).
    /// The key is optional; when present it is sent as X-API-Key.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TESSERA_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let auth = std::env::var("TESSERA_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.is_empty())
            .map(Auth::XApiKey);

        Self::new(base_url, auth)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(Auth::Bearer(token)) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            Some(Auth::XApiKey(key)) => request.header("X-API-Key", key.as_str()),
            None => request,
        }
    }

    /// POST one chunk to the upload route. The response is returned whatever its status.
    pub async fn post_chunk(
        &self,
        headers: HeaderMap,
        form: Form,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let url = self.build_url(UPLOAD_ROUTE);
        let request = self.client.post(&url).headers(headers).multipart(form);
        let request = self.apply_auth(request);

        request.send().await
    }
}
