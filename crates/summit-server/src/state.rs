//! Shared state for HTTP handlers.

use std::sync::Arc;

use summit_core::MemoryStore;

use crate::{api::ConferenceApi, config::ServerConfig};

/// The API as served over HTTP.
pub type ServerApi = ConferenceApi<MemoryStore>;

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    /// Operations
    pub api: Arc<ServerApi>,
    /// Server-side configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Wrap an API with default configuration.
    #[must_use]
    pub fn new(api: Arc<ServerApi>) -> Self {
        Self { api, config: ServerConfig::default() }
    }

    /// Wrap an API with explicit configuration.
    #[must_use]
    pub fn with_config(api: Arc<ServerApi>, config: ServerConfig) -> Self {
        Self { api, config }
    }
}
