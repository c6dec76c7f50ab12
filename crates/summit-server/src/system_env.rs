//! Production Environment implementation using the system clock.

use std::time::Duration;

use summit_core::Environment;

/// Production environment on the system clock.
///
/// - `std::time::Instant::now()` for time
/// - `tokio::time::sleep()` for async sleeping
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
