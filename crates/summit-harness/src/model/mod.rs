//! Reference model for model-based testing.
//!
//! The model keeps seat counts and per-user lists in plain collections,
//! with no store, keys or transactions. It serves as the oracle against
//! which the ledger is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod world;

pub use operation::{
    ConferenceSlot, Operation, OperationError, OperationResult, SessionSlot, UserSlot,
};
pub use world::{ModelWorld, ObservableState};
