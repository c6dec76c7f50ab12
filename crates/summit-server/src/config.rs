//! Server configuration.

use std::time::Duration;

/// Runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// How often the nearly-sold-out announcement is recomputed
    pub announcement_interval: Duration,
    /// Lifetime of cached announcements, `None` to keep until replaced
    pub cache_ttl: Option<Duration>,
    /// Per-request timeout
    pub request_timeout: Option<Duration>,
    /// Maximum in-flight requests
    pub concurrency_limit: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            announcement_interval: Duration::from_secs(60),
            cache_ttl: None,
            request_timeout: Some(Duration::from_secs(30)),
            concurrency_limit: Some(1024),
        }
    }
}
