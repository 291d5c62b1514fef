//! Route configuration and setup.

use crate::auth::{upload_auth_middleware, UploadAuthState};
use crate::handlers::{artifacts, health, upload};
use crate::middleware::{body_limit_middleware, panic_response, request_id_middleware};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tessera_core::protocol::{ARTIFACT_PREFIX, UPLOAD_ROUTE};
use tessera_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the chunk bytes
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let body_limit = config.max_chunk_size() + MULTIPART_OVERHEAD_BYTES;
    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP limits enabled"
    );

    let app = public_routes()
        .merge(upload_routes(config))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            body_limit,
            body_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {}: {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route(
            &format!("{}/{{filename}}", ARTIFACT_PREFIX),
            get(artifacts::get_artifact),
        )
}

fn upload_routes(config: &Config) -> Router<Arc<AppState>> {
    let router = Router::new().route(UPLOAD_ROUTE, post(upload::upload_chunk));

    match config.upload_api_key() {
        Some(key) => router.route_layer(axum::middleware::from_fn_with_state(
            Arc::new(UploadAuthState {
                api_key: key.to_string(),
            }),
            upload_auth_middleware,
        )),
        None => {
            tracing::warn!(
                "UPLOAD_API_KEY not set - upload route accepts unauthenticated requests"
            );
            router
        }
    }
}
