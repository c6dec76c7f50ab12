//! Entity store abstraction.
//!
//! The store holds every entity kind in one keyed space and supports
//! ancestor-scoped queries and atomic read-modify-write transactions.
//!
//! # Invariants
//!
//! - Atomicity: a transaction whose body returns `Err` leaves no writes behind
//! - Isolation: transactions are serializable; two transactions never
//!   interleave their reads and writes
//! - Id uniqueness: `allocate_id` never returns the same id twice for the
//!   lifetime of the store

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use thiserror::Error;

use crate::{
    entity::{AnyKey, AnyRecord, Kind, Record},
    query::Query,
};

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not serve the request. Transient.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// A key resolved to a record of a different kind.
    #[error("expected {expected} record, found {found}")]
    KindMismatch {
        /// Requested kind
        expected: Kind,
        /// Stored kind
        found: Kind,
    },
}

/// Reads and writes inside one transaction.
///
/// Object safe, so stores can hand the body a `&mut dyn Transaction`. Use
/// the typed [`get`](#method.get) and [`put`](#method.put) helpers instead
/// of the erased methods.
pub trait Transaction {
    /// Read a record by erased key, seeing this transaction's own writes.
    fn get_any(&mut self, key: &AnyKey) -> Result<Option<AnyRecord>, StoreError>;

    /// Insert or replace a record.
    fn put_any(&mut self, record: AnyRecord) -> Result<(), StoreError>;
}

impl dyn Transaction + '_ {
    /// Read a typed record.
    pub fn get<R: Record>(&mut self, key: &R::Key) -> Result<Option<R>, StoreError> {
        self.get_any(&R::wrap_key(key.clone()))?.map(downcast::<R>).transpose()
    }

    /// Write a typed record.
    pub fn put<R: Record>(&mut self, record: R) -> Result<(), StoreError> {
        self.put_any(record.into_any())
    }
}

fn downcast<R: Record>(record: AnyRecord) -> Result<R, StoreError> {
    let found = record.kind();
    R::from_any(record).ok_or(StoreError::KindMismatch { expected: R::KIND, found })
}

/// Keyed entity storage.
pub trait Store: Send + Sync + 'static {
    /// Allocate a fresh id, unique across all kinds.
    fn allocate_id(&self) -> Result<u64, StoreError>;

    /// Read one record.
    fn get<R: Record>(&self, key: &R::Key) -> Result<Option<R>, StoreError>;

    /// Read several records. Missing keys produce `None` at their position.
    fn get_multi<R: Record>(&self, keys: &[R::Key]) -> Result<Vec<Option<R>>, StoreError> {
        keys.iter().map(|key| self.get::<R>(key)).collect()
    }

    /// Insert or replace one record outside any transaction.
    fn put<R: Record>(&self, record: R) -> Result<(), StoreError>;

    /// Run a query.
    fn query<R: Record>(&self, query: &Query<R>) -> Result<Vec<R>, StoreError>;

    /// Run `body` atomically. When the body returns `Err` its writes are
    /// discarded and the error is returned unchanged.
    fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<AnyKey, AnyRecord>,
    next_id: u64,
}

/// In-memory store for tests and single-process deployments.
///
/// One mutex guards the whole key space; transactions hold it for their
/// full duration, which makes them trivially serializable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of every kind.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |inner| inner.records.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn allocate_id(&self) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        Ok(inner.next_id)
    }

    fn get<R: Record>(&self, key: &R::Key) -> Result<Option<R>, StoreError> {
        let inner = self.lock()?;
        inner.records.get(&R::wrap_key(key.clone())).cloned().map(downcast::<R>).transpose()
    }

    fn put<R: Record>(&self, record: R) -> Result<(), StoreError> {
        let record = record.into_any();
        self.lock()?.records.insert(record.key(), record);
        Ok(())
    }

    fn query<R: Record>(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        let candidates: Vec<R> = {
            let inner = self.lock()?;
            inner
                .records
                .values()
                .filter(|record| record.kind() == R::KIND)
                .cloned()
                .filter_map(R::from_any)
                .collect()
        };
        Ok(query.apply(candidates))
    }

    fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut inner = self.lock()?;
        let mut txn = MemoryTransaction { inner: &mut *inner, undo: Vec::new() };

        let result = body(&mut txn);
        if result.is_err() {
            txn.rollback();
        }
        result
    }
}

struct MemoryTransaction<'a> {
    inner: &'a mut Inner,
    undo: Vec<(AnyKey, Option<AnyRecord>)>,
}

impl MemoryTransaction<'_> {
    fn rollback(&mut self) {
        while let Some((key, previous)) = self.undo.pop() {
            match previous {
                Some(record) => self.inner.records.insert(key, record),
                None => self.inner.records.remove(&key),
            };
        }
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn get_any(&mut self, key: &AnyKey) -> Result<Option<AnyRecord>, StoreError> {
        Ok(self.inner.records.get(key).cloned())
    }

    fn put_any(&mut self, record: AnyRecord) -> Result<(), StoreError> {
        let key = record.key();
        let previous = self.inner.records.insert(key.clone(), record);
        self.undo.push((key, previous));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::{Speaker, SpeakerField},
        key::{SpeakerKey, UserId},
        query::Operator,
    };

    fn speaker(owner: &str, id: u64, name: &str) -> Speaker {
        Speaker { key: SpeakerKey::new(UserId::new(owner).unwrap(), id), display_name: name.into() }
    }

    #[test]
    fn allocated_ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.allocate_id().unwrap();
        let b = store.allocate_id().unwrap();
        assert_ne!(a, b);
        assert!(a > 0);
    }

    #[test]
    fn put_then_get() {
        let store = MemoryStore::new();
        let ada = speaker("ada", 1, "Ada");
        store.put(ada.clone()).unwrap();
        assert_eq!(store.get::<Speaker>(&ada.key).unwrap(), Some(ada));
        let missing = SpeakerKey::new(UserId::new("ada").unwrap(), 2);
        assert_eq!(store.get::<Speaker>(&missing).unwrap(), None);
    }

    #[test]
    fn get_multi_keeps_positions() {
        let store = MemoryStore::new();
        let ada = speaker("ada", 1, "Ada");
        store.put(ada.clone()).unwrap();
        let missing = SpeakerKey::new(UserId::new("ada").unwrap(), 9);

        let found = store.get_multi::<Speaker>(&[missing, ada.key.clone()]).unwrap();
        assert_eq!(found, vec![None, Some(ada)]);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let store = MemoryStore::new();
        let ada = speaker("ada", 1, "Ada");
        store.put(ada.clone()).unwrap();

        let result: Result<(), StoreError> = store.transaction(|txn| {
            txn.put(Speaker { display_name: "Renamed".into(), ..ada.clone() })?;
            txn.put(speaker("ada", 2, "New"))?;
            Err(StoreError::Unavailable("injected".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.get::<Speaker>(&ada.key).unwrap(), Some(ada));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn transaction_sees_own_writes() {
        let store = MemoryStore::new();
        let ada = speaker("ada", 1, "Ada");

        let seen: Result<Option<Speaker>, StoreError> = store.transaction(|txn| {
            txn.put(ada.clone())?;
            txn.get::<Speaker>(&ada.key)
        });

        assert_eq!(seen.unwrap(), Some(ada));
    }

    #[test]
    fn query_is_scoped_to_kind_and_ancestor() {
        let store = MemoryStore::new();
        store.put(speaker("ada", 1, "Ada")).unwrap();
        store.put(speaker("ada", 2, "Babbage")).unwrap();
        store.put(speaker("grace", 3, "Ada")).unwrap();

        let query = Query::<Speaker>::new()
            .ancestor(AnyKey::Profile(UserId::new("ada").unwrap()))
            .filter(SpeakerField::DisplayName, Operator::Eq, "Ada");
        let found = store.query(&query).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key.id, 1);
    }
}
