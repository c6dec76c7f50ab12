//! Fault injection tests for the registration ledger.
//!
//! A [`ChaoticStore`] fails a seeded fraction of calls. Every failed
//! operation must leave the store exactly as it was, so a model that skips
//! failed operations stays in lockstep with the ledger.

use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use proptest::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use summit_core::MemoryStore;
use summit_harness::{ChaoticStore, LedgerWorld, ModelWorld, Operation, UserSlot};

type ChaoticWorld = LedgerWorld<ChaoticStore<MemoryStore>>;

const CAPACITIES: [u32; 3] = [2, 3, 1];
const SESSIONS: u8 = 3;
const USERS: UserSlot = 5;

fn chaotic_world(seed: u64) -> ChaoticWorld {
    let store = Arc::new(ChaoticStore::new(MemoryStore::new(), seed, 0.0));
    LedgerWorld::new(store, &CAPACITIES, SESSIONS).unwrap()
}

/// Keep generated slots inside a small space so operations collide often.
fn narrow(op: Operation) -> Operation {
    let user = |user: u8| user % USERS;
    let conference = |slot: u8| slot % 4;
    let session = |slot: u8| slot % 4;
    match op {
        Operation::Register { user: u, conference: c } => {
            Operation::Register { user: user(u), conference: conference(c) }
        },
        Operation::Unregister { user: u, conference: c } => {
            Operation::Unregister { user: user(u), conference: conference(c) }
        },
        Operation::AddToWishlist { user: u, session: s } => {
            Operation::AddToWishlist { user: user(u), session: session(s) }
        },
        Operation::RemoveFromWishlist { user: u, session: s } => {
            Operation::RemoveFromWishlist { user: user(u), session: session(s) }
        },
    }
}

/// Run `ops` with failures enabled, mirroring successes into the model.
/// Returns the number of failed operations.
fn run_in_lockstep(world: &ChaoticWorld, ops: &[Operation], failure_rate: f64) -> usize {
    let mut model = ModelWorld::new(&CAPACITIES, SESSIONS);
    let mut failed = 0;

    world.store().set_failure_rate(failure_rate);
    for op in ops {
        let real = world.apply(op);
        if real.is_unavailable() {
            failed += 1;
            continue;
        }
        assert_eq!(model.apply(op), real, "divergence on {op:?}");
    }
    world.store().set_failure_rate(0.0);

    assert_eq!(model.observable_state(), world.observable_state(0..USERS).unwrap());
    failed
}

#[test]
fn failed_operations_leave_no_trace() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut bytes = vec![0u8; 4096];
    rng.fill_bytes(&mut bytes);

    let mut input = Unstructured::new(&bytes);
    let mut ops = Vec::new();
    while let Ok(op) = Operation::arbitrary(&mut input) {
        ops.push(narrow(op));
        if input.is_empty() {
            break;
        }
    }
    assert!(ops.len() > 100);

    let world = chaotic_world(1);
    let failed = run_in_lockstep(&world, &ops, 0.25);

    assert!(failed > 0, "expected some injected failures");
    assert!(world.store().injected_failures() >= u64::try_from(failed).unwrap());
}

#[test]
fn commit_failure_rolls_back_registration() {
    let world = chaotic_world(9);
    world.store().fail_next_commit();

    let result = world.apply(&Operation::Register { user: 0, conference: 0 });
    assert!(result.is_unavailable());
    assert_eq!(world.store().injected_failures(), 1);

    let state = world.observable_state(0..USERS).unwrap();
    assert_eq!(state.seats_available, CAPACITIES.to_vec());
    assert!(state.registrations.is_empty());
}

#[test]
fn total_outage_then_recovery() {
    let world = chaotic_world(3);
    let ops: Vec<_> = (0..USERS)
        .map(|user| Operation::Register { user, conference: 1 })
        .collect();

    assert_eq!(run_in_lockstep(&world, &ops, 1.0), ops.len());
    assert_eq!(run_in_lockstep(&world, &ops, 0.0), 0);
    assert_eq!(world.observable_state(0..USERS).unwrap().seats_available, vec![2, 0, 1]);
}

proptest! {
    #[test]
    fn prop_lockstep_under_faults(
        seed in any::<u64>(),
        ops in prop::collection::vec(any::<(u8, u8, u8)>(), 0..60),
    ) {
        let ops: Vec<Operation> = ops
            .into_iter()
            .map(|(kind, user, slot)| {
                narrow(match kind % 4 {
                    0 => Operation::Register { user, conference: slot },
                    1 => Operation::Unregister { user, conference: slot },
                    2 => Operation::AddToWishlist { user, session: slot },
                    _ => Operation::RemoveFromWishlist { user, session: slot },
                })
            })
            .collect();

        let world = chaotic_world(seed);
        run_in_lockstep(&world, &ops, 0.3);
    }
}
