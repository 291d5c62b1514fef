//! Tessera API Library
//!
//! HTTP receiver for chunked uploads, artifact serving, health checks and application setup.

mod handlers;
mod middleware;
mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::HttpAppError;
pub use state::AppState;
