//! Concurrent registration tests
//!
//! Many threads race on one conference. Transactions must serialize them so
//! no seat is sold twice and no registration is lost.

use std::{sync::Arc, thread};

use summit_core::{LedgerError, MemoryStore};
use summit_harness::{LedgerWorld, Operation, OperationError, OperationResult};

#[test]
fn hundred_callers_fifty_seats() {
    let world = LedgerWorld::new(Arc::new(MemoryStore::new()), &[50], 0).unwrap();

    let results: Vec<OperationResult> = thread::scope(|scope| {
        let handles: Vec<_> = (0..100u8)
            .map(|user| {
                let world = &world;
                scope.spawn(move || world.apply(&Operation::Register { user, conference: 0 }))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|result| **result == OperationResult::Error(OperationError::SoldOut))
        .count();
    assert_eq!(accepted, 50);
    assert_eq!(sold_out, 50);

    let state = world.observable_state(0..100).unwrap();
    assert_eq!(state.seats_available, vec![0]);
    assert_eq!(state.registrations.len(), 50);
}

#[test]
fn same_caller_racing_gets_one_seat() {
    let world = LedgerWorld::new(Arc::new(MemoryStore::new()), &[10], 0).unwrap();
    let key = world.conference_key(0);

    let results: Vec<Result<(), LedgerError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| world.ledger().register(world.caller(7), &key)))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| *err == LedgerError::AlreadyRegistered)
    );

    let state = world.observable_state([7]).unwrap();
    assert_eq!(state.seats_available, vec![9]);
    assert_eq!(state.registrations.get(&7), Some(&vec![0]));
}

#[test]
fn register_and_unregister_interleaved() {
    let world = LedgerWorld::new(Arc::new(MemoryStore::new()), &[4], 0).unwrap();

    thread::scope(|scope| {
        for user in 0..8u8 {
            let world = &world;
            scope.spawn(move || {
                for _ in 0..25 {
                    world.apply(&Operation::Register { user, conference: 0 });
                    world.apply(&Operation::Unregister { user, conference: 0 });
                }
            });
        }
    });

    let state = world.observable_state(0..8).unwrap();
    assert_eq!(state.seats_available, vec![4]);
    assert!(state.registrations.is_empty());
}
