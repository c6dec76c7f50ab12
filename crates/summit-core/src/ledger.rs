//! Registration Ledger: atomic seat accounting and session wishlists.
//!
//! Every mutation reads the caller's profile and the target record, checks
//! the preconditions and writes both back inside one store transaction, so
//! concurrent registrations on the same conference or profile never lose an
//! update.
//!
//! # Invariants
//!
//! - `0 <= seats_available <= max_attendees`
//! - `seats_available == max_attendees - attendees`, where attendees counts
//!   the profiles listing the conference
//! - A profile lists a conference (or wishlists a session) at most once

use std::sync::Arc;

use thiserror::Error;

use crate::{
    caller::Caller,
    entity::{Conference, Profile, Session},
    key::{ConferenceKey, SessionKey},
    store::{Store, StoreError, Transaction},
};

/// Errors from ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The conference key does not resolve.
    #[error("no conference found with key: {0}")]
    ConferenceNotFound(ConferenceKey),

    /// The session key does not resolve.
    #[error("no session found with key: {0}")]
    SessionNotFound(SessionKey),

    /// The caller already registered for the conference.
    #[error("you have already registered for this conference")]
    AlreadyRegistered,

    /// No seats left.
    #[error("there are no seats available")]
    SoldOut,

    /// The session is already in the caller's wishlist.
    #[error("session is already in your wishlist")]
    AlreadyWishlisted,

    /// The store failed; the transaction left no writes.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load the caller's profile inside a transaction, or build a fresh one.
///
/// A fresh profile is not written here; it is persisted by whichever
/// mutation follows.
pub fn load_or_create_profile(
    txn: &mut dyn Transaction,
    caller: &Caller,
) -> Result<Profile, StoreError> {
    Ok(txn.get::<Profile>(&caller.user_id)?.unwrap_or_else(|| Profile::for_caller(caller)))
}

/// Seat and wishlist bookkeeping over a [`Store`].
#[derive(Debug)]
pub struct Ledger<S> {
    store: Arc<S>,
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: Store> Ledger<S> {
    /// Create a ledger over a shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register the caller for a conference, taking one seat.
    ///
    /// # Errors
    ///
    /// Checked in order: `ConferenceNotFound`, `AlreadyRegistered`,
    /// `SoldOut`. Store failures surface as `Store`. On any error nothing is
    /// written.
    pub fn register(&self, caller: &Caller, key: &ConferenceKey) -> Result<(), LedgerError> {
        self.store.transaction(|txn| {
            let mut conference = txn
                .get::<Conference>(key)?
                .ok_or_else(|| LedgerError::ConferenceNotFound(key.clone()))?;
            let mut profile = load_or_create_profile(txn, caller)?;

            if profile.is_attending(key) {
                return Err(LedgerError::AlreadyRegistered);
            }
            conference.seats_available =
                conference.seats_available.checked_sub(1).ok_or(LedgerError::SoldOut)?;
            profile.conference_keys_to_attend.push(key.clone());

            let seats = conference.seats_available;
            txn.put(profile)?;
            txn.put(conference)?;

            tracing::debug!(user = %caller.user_id, conference = %key, seats, "registered");
            Ok(())
        })
    }

    /// Unregister the caller, returning the seat.
    ///
    /// Returns `false` without writing anything when the caller was not
    /// registered.
    ///
    /// # Errors
    ///
    /// `ConferenceNotFound` when the key does not resolve; `Store` on store
    /// failure.
    pub fn unregister(&self, caller: &Caller, key: &ConferenceKey) -> Result<bool, LedgerError> {
        self.store.transaction(|txn| {
            let mut conference = txn
                .get::<Conference>(key)?
                .ok_or_else(|| LedgerError::ConferenceNotFound(key.clone()))?;
            let mut profile = load_or_create_profile(txn, caller)?;

            let Some(position) = profile.conference_keys_to_attend.iter().position(|k| k == key)
            else {
                return Ok(false);
            };
            profile.conference_keys_to_attend.remove(position);
            conference.seats_available =
                conference.seats_available.saturating_add(1).min(conference.max_attendees);

            let seats = conference.seats_available;
            txn.put(profile)?;
            txn.put(conference)?;

            tracing::debug!(user = %caller.user_id, conference = %key, seats, "unregistered");
            Ok(true)
        })
    }

    /// Add a session to the caller's wishlist.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, then `AlreadyWishlisted`; `Store` on store failure.
    pub fn add_to_wishlist(&self, caller: &Caller, key: &SessionKey) -> Result<(), LedgerError> {
        self.store.transaction(|txn| {
            if txn.get::<Session>(key)?.is_none() {
                return Err(LedgerError::SessionNotFound(key.clone()));
            }
            let mut profile = load_or_create_profile(txn, caller)?;
            if profile.session_keys_wishlist.contains(key) {
                return Err(LedgerError::AlreadyWishlisted);
            }
            profile.session_keys_wishlist.push(key.clone());
            txn.put(profile)?;
            Ok(())
        })
    }

    /// Remove a session from the caller's wishlist. `false` when absent.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` when the key does not resolve; `Store` on store
    /// failure.
    pub fn remove_from_wishlist(
        &self,
        caller: &Caller,
        key: &SessionKey,
    ) -> Result<bool, LedgerError> {
        self.store.transaction(|txn| {
            if txn.get::<Session>(key)?.is_none() {
                return Err(LedgerError::SessionNotFound(key.clone()));
            }
            let mut profile = load_or_create_profile(txn, caller)?;
            let before = profile.session_keys_wishlist.len();
            profile.session_keys_wishlist.retain(|k| k != key);
            if profile.session_keys_wishlist.len() == before {
                return Ok(false);
            }
            txn.put(profile)?;
            Ok(true)
        })
    }

    /// Conferences the caller is registered for, in registration order.
    /// Keys that no longer resolve are skipped.
    pub fn conferences_to_attend(&self, caller: &Caller) -> Result<Vec<Conference>, LedgerError> {
        let Some(profile) = self.store.get::<Profile>(&caller.user_id)? else {
            return Ok(Vec::new());
        };
        let found = self.store.get_multi::<Conference>(&profile.conference_keys_to_attend)?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Sessions in the caller's wishlist, in insertion order. Keys that no
    /// longer resolve are skipped.
    pub fn wishlist(&self, caller: &Caller) -> Result<Vec<Session>, LedgerError> {
        let Some(profile) = self.store.get::<Profile>(&caller.user_id)? else {
            return Ok(Vec::new());
        };
        let found = self.store.get_multi::<Session>(&profile.session_keys_wishlist)?;
        Ok(found.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{key::UserId, store::MemoryStore};

    fn caller(id: &str) -> Caller {
        Caller::new(UserId::new(id).unwrap(), format!("{id}@example.com"), id)
    }

    fn setup(max_attendees: u32) -> (Arc<MemoryStore>, Ledger<MemoryStore>, ConferenceKey) {
        let store = Arc::new(MemoryStore::new());
        let organizer = UserId::new("organizer").unwrap();
        let key = ConferenceKey::new(organizer, store.allocate_id().unwrap());
        store
            .put(Conference {
                key: key.clone(),
                name: "RustConf".into(),
                description: None,
                city: "Portland".into(),
                topics: vec![],
                start_date: None,
                end_date: None,
                month: 0,
                max_attendees,
                seats_available: max_attendees,
            })
            .unwrap();
        (Arc::clone(&store), Ledger::new(store), key)
    }

    fn seats(store: &MemoryStore, key: &ConferenceKey) -> u32 {
        store.get::<Conference>(key).unwrap().unwrap().seats_available
    }

    #[test]
    fn register_takes_a_seat() {
        let (store, ledger, key) = setup(2);
        ledger.register(&caller("ada"), &key).unwrap();

        assert_eq!(seats(&store, &key), 1);
        let profile = store.get::<Profile>(&UserId::new("ada").unwrap()).unwrap().unwrap();
        assert_eq!(profile.conference_keys_to_attend, vec![key]);
    }

    #[test]
    fn double_registration_conflicts() {
        let (store, ledger, key) = setup(5);
        ledger.register(&caller("ada"), &key).unwrap();
        assert_eq!(ledger.register(&caller("ada"), &key), Err(LedgerError::AlreadyRegistered));
        assert_eq!(seats(&store, &key), 4);
    }

    #[test]
    fn zero_capacity_is_sold_out() {
        let (store, ledger, key) = setup(0);
        assert_eq!(ledger.register(&caller("ada"), &key), Err(LedgerError::SoldOut));
        assert_eq!(seats(&store, &key), 0);
        assert!(store.get::<Profile>(&UserId::new("ada").unwrap()).unwrap().is_none());
    }

    #[test]
    fn fifty_seats_then_sold_out_then_one_more() {
        let (store, ledger, key) = setup(50);
        for i in 0..50 {
            ledger.register(&caller(&format!("user{i}")), &key).unwrap();
        }
        assert_eq!(seats(&store, &key), 0);
        assert_eq!(ledger.register(&caller("late"), &key), Err(LedgerError::SoldOut));

        assert!(ledger.unregister(&caller("user7"), &key).unwrap());
        ledger.register(&caller("late"), &key).unwrap();
        assert_eq!(ledger.register(&caller("later"), &key), Err(LedgerError::SoldOut));
    }

    #[test]
    fn unregister_without_registration_is_false() {
        let (store, ledger, key) = setup(3);
        assert!(!ledger.unregister(&caller("ada"), &key).unwrap());
        assert_eq!(seats(&store, &key), 3);
    }

    #[test]
    fn unknown_conference_is_not_found() {
        let (_, ledger, key) = setup(3);
        let missing = ConferenceKey::new(key.organizer.clone(), key.id + 100);
        assert_eq!(
            ledger.register(&caller("ada"), &missing),
            Err(LedgerError::ConferenceNotFound(missing.clone()))
        );
        assert_eq!(
            ledger.unregister(&caller("ada"), &missing),
            Err(LedgerError::ConferenceNotFound(missing))
        );
    }

    #[test]
    fn wishlist_add_remove() {
        let (store, ledger, key) = setup(3);
        let session_key = SessionKey::new(key, store.allocate_id().unwrap());
        store
            .put(Session {
                key: session_key.clone(),
                name: "Ownership".into(),
                highlights: None,
                speaker: None,
                duration_minutes: Some(30),
                type_of_session: Some("talk".into()),
                date: None,
                start_time: None,
            })
            .unwrap();
        let ada = caller("ada");

        ledger.add_to_wishlist(&ada, &session_key).unwrap();
        assert_eq!(ledger.add_to_wishlist(&ada, &session_key), Err(LedgerError::AlreadyWishlisted));
        assert_eq!(ledger.wishlist(&ada).unwrap().len(), 1);

        assert!(ledger.remove_from_wishlist(&ada, &session_key).unwrap());
        assert!(!ledger.remove_from_wishlist(&ada, &session_key).unwrap());
        assert!(ledger.wishlist(&ada).unwrap().is_empty());
    }

    #[test]
    fn attending_lists_registered_conferences() {
        let (_, ledger, key) = setup(3);
        let ada = caller("ada");
        assert!(ledger.conferences_to_attend(&ada).unwrap().is_empty());

        ledger.register(&ada, &key).unwrap();
        let attending = ledger.conferences_to_attend(&ada).unwrap();
        assert_eq!(attending.len(), 1);
        assert_eq!(attending[0].key, key);
    }
}
