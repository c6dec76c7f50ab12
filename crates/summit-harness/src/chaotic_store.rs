//! Store wrapper that injects seeded failures.
//!
//! Reads and writes fail before touching the inner store. Transactions fail
//! either before the body runs or after it, while the inner transaction is
//! still open, so the inner store must discard the body's writes.

use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use summit_core::{Query, Record, Store, StoreError, Transaction};

/// A [`Store`] that fails a seeded fraction of calls.
#[derive(Debug)]
pub struct ChaoticStore<S> {
    inner: S,
    rng: Mutex<ChaCha8Rng>,
    failure_rate: Mutex<f64>,
    fail_next_commit: AtomicBool,
    injected: AtomicU64,
}

impl<S: Store> ChaoticStore<S> {
    /// Wrap `inner`. `failure_rate` is clamped to `0.0..=1.0`.
    pub fn new(inner: S, seed: u64, failure_rate: f64) -> Self {
        Self {
            inner,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            failure_rate: Mutex::new(failure_rate.clamp(0.0, 1.0)),
            fail_next_commit: AtomicBool::new(false),
            injected: AtomicU64::new(0),
        }
    }

    /// Change the failure rate. `0.0` makes the store fully reliable.
    pub fn set_failure_rate(&self, failure_rate: f64) {
        *lock(&self.failure_rate) = failure_rate.clamp(0.0, 1.0);
    }

    /// Fail the next transaction after its body has run.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::Relaxed);
    }

    /// Number of failures injected so far.
    pub fn injected_failures(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn chaos(&self, operation: &str) -> Result<(), StoreError> {
        let rate = *lock(&self.failure_rate);
        if rate > 0.0 && lock(&self.rng).gen_bool(rate) {
            return Err(self.inject(operation));
        }
        Ok(())
    }

    fn commit_chaos(&self) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::Relaxed) {
            return Err(self.inject("commit"));
        }
        self.chaos("commit")
    }

    fn inject(&self, operation: &str) -> StoreError {
        self.injected.fetch_add(1, Ordering::Relaxed);
        StoreError::Unavailable(format!("injected failure in {operation}"))
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn allocate_id(&self) -> Result<u64, StoreError> {
        self.chaos("allocate_id")?;
        self.inner.allocate_id()
    }

    fn get<R: Record>(&self, key: &R::Key) -> Result<Option<R>, StoreError> {
        self.chaos("get")?;
        self.inner.get(key)
    }

    fn put<R: Record>(&self, record: R) -> Result<(), StoreError> {
        self.chaos("put")?;
        self.inner.put(record)
    }

    fn query<R: Record>(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        self.chaos("query")?;
        self.inner.query(query)
    }

    fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.chaos("begin")?;
        self.inner.transaction(|txn| {
            let value = body(txn)?;
            self.commit_chaos()?;
            Ok(value)
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
