//! Real ledger wrapper that mirrors [`ModelWorld`](crate::ModelWorld)'s
//! interface.

use std::{collections::BTreeMap, sync::Arc};

use summit_core::{
    Caller, Conference, ConferenceKey, KeyError, Ledger, Profile, Session, SessionKey, Store,
    StoreError, UserId,
};
use thiserror::Error;

use crate::model::{
    ConferenceSlot, ObservableState, Operation, OperationError, OperationResult, SessionSlot,
    UserSlot,
};

/// Ids used for slots that were never seeded. No allocated id reaches them.
const UNKNOWN_ID_BASE: u64 = 1 << 32;

/// Errors from seeding a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Store failure while seeding or reading back
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid user id
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// A ledger over a seeded store.
pub struct LedgerWorld<S> {
    store: Arc<S>,
    ledger: Ledger<S>,
    organizer: UserId,
    callers: Vec<Caller>,
    conferences: Vec<ConferenceKey>,
    sessions: Vec<SessionKey>,
}

impl<S: Store> LedgerWorld<S> {
    /// Seed one conference per capacity and `sessions` sessions spread
    /// round-robin over them.
    pub fn new(store: Arc<S>, capacities: &[u32], sessions: u8) -> Result<Self, WorldError> {
        let organizer = UserId::new("organizer")?;
        let callers = (0..=UserSlot::MAX).map(caller).collect::<Result<Vec<_>, _>>()?;

        let mut conferences = Vec::with_capacity(capacities.len());
        for (index, capacity) in capacities.iter().enumerate() {
            let key = ConferenceKey::new(organizer.clone(), store.allocate_id()?);
            store.put(Conference {
                key: key.clone(),
                name: format!("Conference {index}"),
                description: None,
                city: "Default City".to_string(),
                topics: Vec::new(),
                start_date: None,
                end_date: None,
                month: 0,
                max_attendees: *capacity,
                seats_available: *capacity,
            })?;
            conferences.push(key);
        }

        let mut session_keys = Vec::with_capacity(usize::from(sessions));
        if !conferences.is_empty() {
            for index in 0..usize::from(sessions) {
                let conference = conferences[index % conferences.len()].clone();
                let key = SessionKey::new(conference, store.allocate_id()?);
                store.put(Session {
                    key: key.clone(),
                    name: format!("Session {index}"),
                    highlights: None,
                    speaker: None,
                    duration_minutes: None,
                    type_of_session: None,
                    date: None,
                    start_time: None,
                })?;
                session_keys.push(key);
            }
        }

        let ledger = Ledger::new(Arc::clone(&store));
        Ok(Self { store, ledger, organizer, callers, conferences, sessions: session_keys })
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The ledger under test.
    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    /// Key a conference slot maps to.
    pub fn conference_key(&self, slot: ConferenceSlot) -> ConferenceKey {
        self.conferences.get(usize::from(slot)).cloned().unwrap_or_else(|| {
            ConferenceKey::new(self.organizer.clone(), UNKNOWN_ID_BASE + u64::from(slot))
        })
    }

    /// Key a session slot maps to.
    pub fn session_key(&self, slot: SessionSlot) -> SessionKey {
        self.sessions.get(usize::from(slot)).cloned().unwrap_or_else(|| {
            let conference = self.conference_key(0);
            SessionKey::new(conference, UNKNOWN_ID_BASE + u64::from(slot))
        })
    }

    /// Caller acting for a user slot.
    pub fn caller(&self, user: UserSlot) -> &Caller {
        &self.callers[usize::from(user)]
    }

    /// Apply an operation through the ledger.
    pub fn apply(&self, op: &Operation) -> OperationResult {
        let caller = self.caller(op.user());
        let result = match *op {
            Operation::Register { conference, .. } => {
                self.ledger.register(caller, &self.conference_key(conference)).map(|()| None)
            },
            Operation::Unregister { conference, .. } => {
                self.ledger.unregister(caller, &self.conference_key(conference)).map(Some)
            },
            Operation::AddToWishlist { session, .. } => {
                self.ledger.add_to_wishlist(caller, &self.session_key(session)).map(|()| None)
            },
            Operation::RemoveFromWishlist { session, .. } => {
                self.ledger.remove_from_wishlist(caller, &self.session_key(session)).map(Some)
            },
        };

        match result {
            Ok(None) => OperationResult::Ok,
            Ok(Some(removed)) => OperationResult::Removed(removed),
            Err(err) => OperationResult::Error(OperationError::from(&err)),
        }
    }

    /// Read the observable state of `users` back from the store.
    pub fn observable_state(
        &self,
        users: impl IntoIterator<Item = UserSlot>,
    ) -> Result<ObservableState, StoreError> {
        let seats_available = self
            .store
            .get_multi::<Conference>(&self.conferences)?
            .into_iter()
            .map(|conference| conference.map_or(0, |conference| conference.seats_available))
            .collect();

        let mut registrations = BTreeMap::new();
        let mut wishlists = BTreeMap::new();
        for user in users {
            let Some(profile) = self.store.get::<Profile>(&self.caller(user).user_id)? else {
                continue;
            };
            let attending: Vec<ConferenceSlot> = profile
                .conference_keys_to_attend
                .iter()
                .filter_map(|key| slot_of(&self.conferences, key))
                .collect();
            let wished: Vec<SessionSlot> = profile
                .session_keys_wishlist
                .iter()
                .filter_map(|key| slot_of(&self.sessions, key))
                .collect();
            if !attending.is_empty() {
                registrations.insert(user, attending);
            }
            if !wished.is_empty() {
                wishlists.insert(user, wished);
            }
        }

        Ok(ObservableState { seats_available, registrations, wishlists })
    }
}

/// Caller for a user slot: `user{slot}`.
pub fn caller(user: UserSlot) -> Result<Caller, KeyError> {
    let name = format!("user{user}");
    Ok(Caller::new(UserId::new(name.clone())?, format!("{name}@example.com"), name))
}

fn slot_of<K: PartialEq>(keys: &[K], key: &K) -> Option<u8> {
    keys.iter().position(|candidate| candidate == key).and_then(|index| u8::try_from(index).ok())
}
