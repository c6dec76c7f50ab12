//! Summit server binary.
//!
//! # Usage
//!
//! ```bash
//! summit-server --bind 0.0.0.0:8080
//!
//! # Refresh announcements every 5 minutes, expire cached texts after 10
//! summit-server --announcement-interval-secs 300 --cache-ttl-secs 600
//! ```

use std::time::Duration;

use clap::Parser;
use summit_server::{Server, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Summit conference API server
#[derive(Parser, Debug)]
#[command(name = "summit-server")]
#[command(about = "Summit conference management API server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seconds between announcement refreshes
    #[arg(long, default_value = "60")]
    announcement_interval_secs: u64,

    /// Lifetime of cached announcements in seconds (0 keeps them until replaced)
    #[arg(long, default_value = "0")]
    cache_ttl_secs: u64,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,

    /// Maximum in-flight requests (0 disables)
    #[arg(long, default_value = "1024")]
    concurrency_limit: usize,
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Summit server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerConfig {
        bind_address: args.bind,
        announcement_interval: Duration::from_secs(args.announcement_interval_secs.max(1)),
        cache_ttl: seconds(args.cache_ttl_secs),
        request_timeout: seconds(args.request_timeout_secs),
        concurrency_limit: (args.concurrency_limit > 0).then_some(args.concurrency_limit),
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
