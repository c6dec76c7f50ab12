//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples time-dependent logic (cache expiry,
//! periodic refreshes) from the system clock. Production code runs on the
//! real clock; tests drive a manual clock and never sleep.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: Implementations must not share global state

use std::time::{Duration, Instant};

/// Abstract environment providing time and async sleeping.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: This method MUST return values that never decrease
    ///   within a single execution context.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (periodic jobs), never by request handling.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
