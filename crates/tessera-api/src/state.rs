//! Application state shared by all handlers.

use std::sync::Arc;
use tessera_core::Config;
use tessera_storage::ChunkStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ChunkStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ChunkStore>) -> Self {
        Self { config, store }
    }
}
