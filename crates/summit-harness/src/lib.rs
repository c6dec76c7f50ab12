//! Test harness for the Summit registration ledger.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of seat accounting
//! and wishlists. Operations are applied to both the model and a
//! [`LedgerWorld`] backed by a real store, and their observable states are
//! compared.
//!
//! # Fault Injection
//!
//! [`ChaoticStore`] wraps any store and fails a seeded fraction of calls,
//! including transactions that fail after their body ran. A correct ledger
//! leaves no trace of a failed operation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chaotic_store;
pub mod ledger_world;
pub mod manual_env;
pub mod model;

pub use chaotic_store::ChaoticStore;
pub use ledger_world::{LedgerWorld, WorldError};
pub use manual_env::ManualEnv;
pub use model::{
    ConferenceSlot, ModelWorld, ObservableState, Operation, OperationError, OperationResult,
    SessionSlot, UserSlot,
};
