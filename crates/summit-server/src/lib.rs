//! Summit conference API server.
//!
//! ## Architecture
//!
//! ```text
//! summit-server
//!   ├─ ConferenceApi    (every operation over Store + Cache + TaskDispatcher)
//!   ├─ router/routes    (axum HTTP surface)
//!   ├─ context          (caller headers, request ids)
//!   ├─ TaskQueue/Worker (background side effects)
//!   └─ SystemEnv        (production Environment impl)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod context;
mod error;
pub mod extract;
pub mod router;
pub mod routes;
pub mod state;
mod system_env;
pub mod tasks;

use std::{net::SocketAddr, sync::Arc};

pub use api::ConferenceApi;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorDetail, ErrorResponse, ServerError};
pub use router::router;
pub use state::{AppState, ServerApi};
use summit_core::{Cache, Environment, MemoryCache, MemoryStore, Task};
pub use system_env::SystemEnv;
pub use tasks::{LogMailer, Mailer, TaskQueue, TaskWorker};
use tokio::{net::TcpListener, sync::mpsc};

/// Production Summit server.
///
/// Owns the listener, the shared API and the background task worker.
pub struct Server {
    listener: TcpListener,
    state: AppState,
    worker: TaskWorker<MemoryStore>,
    receiver: mpsc::UnboundedReceiver<Task>,
    env: SystemEnv,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// Returns error if binding to the address fails.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let store = Arc::new(MemoryStore::new());
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(env.clone(), config.cache_ttl));
        let (queue, receiver) = TaskQueue::new();

        let api =
            Arc::new(ConferenceApi::new(Arc::clone(&store), Arc::clone(&cache), Arc::new(queue)));
        let worker = TaskWorker::new(store, cache, Arc::new(LogMailer));

        let listener = TcpListener::bind(&config.bind_address).await?;
        let state = AppState::with_config(api, config);

        Ok(Self { listener, state, worker, receiver, env })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.listener.local_addr()?);

        tokio::spawn(self.worker.run(self.receiver));
        tokio::spawn(refresh_announcements(
            self.env,
            Arc::clone(&self.state.api),
            self.state.config.announcement_interval,
        ));

        let app = router(self.state);
        axum::serve(self.listener, app).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Recompute the announcement every `interval`, forever.
async fn refresh_announcements<E: Environment>(
    env: E,
    api: Arc<ServerApi>,
    interval: std::time::Duration,
) {
    loop {
        if let Err(err) = api.refresh_announcement() {
            tracing::warn!(error = %err, "periodic announcement refresh failed");
        }
        env.sleep(interval).await;
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutdown signal received");
}
