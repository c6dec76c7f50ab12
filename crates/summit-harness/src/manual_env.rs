//! Environment with a hand-driven clock.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use summit_core::Environment;

/// Deterministic [`Environment`]: time only moves when the test says so.
///
/// Sleeping advances the clock by the requested duration and completes
/// immediately. Clones share one clock.
#[derive(Debug, Clone)]
pub struct ManualEnv {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualEnv {
    /// Create a clock at zero elapsed time.
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }

    /// Time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for ManualEnv {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}
