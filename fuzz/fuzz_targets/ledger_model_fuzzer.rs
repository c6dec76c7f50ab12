//! Fuzz target for the registration ledger against its reference model
//!
//! # Strategy
//!
//! - Arbitrary capacities (small, so conferences sell out)
//! - Arbitrary operation sequences over a handful of users
//! - Slots past the seeded conferences and sessions exercise lookups
//!
//! # Invariants
//!
//! - Every operation returns the same result as the model
//! - Final seats and per-user lists match the model
//! - NEVER panic inside the ledger

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use summit_core::MemoryStore;
use summit_harness::{LedgerWorld, ModelWorld, Operation};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    capacities: Vec<u8>,
    sessions: u8,
    ops: Vec<Operation>,
}

fuzz_target!(|input: FuzzInput| {
    let capacities: Vec<u32> =
        input.capacities.iter().take(8).map(|capacity| u32::from(capacity % 8)).collect();
    let sessions = input.sessions % 8;

    let mut model = ModelWorld::new(&capacities, sessions);
    let Ok(real) = LedgerWorld::new(Arc::new(MemoryStore::new()), &capacities, sessions) else {
        return;
    };

    for op in input.ops.iter().take(256) {
        assert_eq!(model.apply(op), real.apply(op), "divergence on {op:?}");
    }

    let users = 0..=u8::MAX;
    let Ok(state) = real.observable_state(users) else {
        return;
    };
    assert_eq!(model.observable_state(), state);
});
