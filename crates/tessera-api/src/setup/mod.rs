//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::Config;
use tessera_storage::{LocalChunkStore, ReaperHandle, StaleUploadReaper, UploadDirs};

/// A fully wired application ready to be served
pub struct App {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub reaper: Option<ReaperHandle>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment());

    tracing::info!("Configuration loaded and validated successfully");

    let store = LocalChunkStore::new(config.final_dir(), config.tmp_dir())
        .await
        .context("Failed to prepare upload directories")?;

    tracing::info!(
        final_dir = %config.final_dir().display(),
        tmp_dir = %config.tmp_dir().display(),
        "Upload directories ready"
    );

    let reaper = start_reaper(&config, store.dirs().clone());

    let state = Arc::new(AppState::new(config.clone(), Arc::new(store)));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok(App {
        state,
        router,
        reaper,
    })
}

fn start_reaper(config: &Config, dirs: UploadDirs) -> Option<ReaperHandle> {
    if config.reaper_max_age_secs() == 0 {
        tracing::info!("Stale upload reaper disabled");
        return None;
    }

    let reaper = Arc::new(StaleUploadReaper::new(
        dirs,
        Duration::from_secs(config.reaper_max_age_secs()),
        Duration::from_secs(config.reaper_interval_secs().max(1)),
    ));
    Some(reaper.start())
}
