//! Model world: the reference ledger.

use std::collections::BTreeMap;

use super::operation::{
    ConferenceSlot, Operation, OperationError, OperationResult, SessionSlot, UserSlot,
};

/// Observable state for oracle comparison.
///
/// Users with no registrations and an empty wishlist are left out, so a
/// profile that exists but holds nothing compares equal to no profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Seats left per conference slot.
    pub seats_available: Vec<u32>,
    /// Conferences each user attends, in registration order.
    pub registrations: BTreeMap<UserSlot, Vec<ConferenceSlot>>,
    /// Sessions each user wishlisted, in insertion order.
    pub wishlists: BTreeMap<UserSlot, Vec<SessionSlot>>,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    capacities: Vec<u32>,
    sessions: u8,
    registrations: BTreeMap<UserSlot, Vec<ConferenceSlot>>,
    wishlists: BTreeMap<UserSlot, Vec<SessionSlot>>,
}

impl ModelWorld {
    /// Create a world with one conference per capacity and `sessions`
    /// sessions. Sessions need a conference, so there are none without one.
    pub fn new(capacities: &[u32], sessions: u8) -> Self {
        Self {
            capacities: capacities.to_vec(),
            sessions: if capacities.is_empty() { 0 } else { sessions },
            registrations: BTreeMap::new(),
            wishlists: BTreeMap::new(),
        }
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real ledger's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match *op {
            Operation::Register { user, conference } => self.apply_register(user, conference),
            Operation::Unregister { user, conference } => self.apply_unregister(user, conference),
            Operation::AddToWishlist { user, session } => self.apply_add_to_wishlist(user, session),
            Operation::RemoveFromWishlist { user, session } => {
                self.apply_remove_from_wishlist(user, session)
            },
        }
    }

    /// Seats left in a conference, `None` for an unknown slot.
    pub fn seats_available(&self, conference: ConferenceSlot) -> Option<u32> {
        let capacity = *self.capacities.get(usize::from(conference))?;
        Some(capacity - self.attendees(conference))
    }

    /// Users holding a seat in `conference`.
    pub fn attendees(&self, conference: ConferenceSlot) -> u32 {
        let count = self.registrations.values().filter(|list| list.contains(&conference)).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let seats_available = (0..self.capacities.len())
            .filter_map(|slot| ConferenceSlot::try_from(slot).ok())
            .filter_map(|slot| self.seats_available(slot))
            .collect();

        ObservableState {
            seats_available,
            registrations: non_empty(&self.registrations),
            wishlists: non_empty(&self.wishlists),
        }
    }

    fn conference_exists(&self, conference: ConferenceSlot) -> bool {
        usize::from(conference) < self.capacities.len()
    }

    fn session_exists(&self, session: SessionSlot) -> bool {
        session < self.sessions
    }

    fn apply_register(&mut self, user: UserSlot, conference: ConferenceSlot) -> OperationResult {
        let Some(seats) = self.seats_available(conference) else {
            return OperationResult::Error(OperationError::ConferenceNotFound);
        };
        let attending = self.registrations.entry(user).or_default();
        if attending.contains(&conference) {
            return OperationResult::Error(OperationError::AlreadyRegistered);
        }
        if seats == 0 {
            return OperationResult::Error(OperationError::SoldOut);
        }
        attending.push(conference);
        OperationResult::Ok
    }

    fn apply_unregister(&mut self, user: UserSlot, conference: ConferenceSlot) -> OperationResult {
        if !self.conference_exists(conference) {
            return OperationResult::Error(OperationError::ConferenceNotFound);
        }
        let attending = self.registrations.entry(user).or_default();
        let Some(position) = attending.iter().position(|slot| *slot == conference) else {
            return OperationResult::Removed(false);
        };
        attending.remove(position);
        OperationResult::Removed(true)
    }

    fn apply_add_to_wishlist(&mut self, user: UserSlot, session: SessionSlot) -> OperationResult {
        if !self.session_exists(session) {
            return OperationResult::Error(OperationError::SessionNotFound);
        }
        let wishlist = self.wishlists.entry(user).or_default();
        if wishlist.contains(&session) {
            return OperationResult::Error(OperationError::AlreadyWishlisted);
        }
        wishlist.push(session);
        OperationResult::Ok
    }

    fn apply_remove_from_wishlist(
        &mut self,
        user: UserSlot,
        session: SessionSlot,
    ) -> OperationResult {
        if !self.session_exists(session) {
            return OperationResult::Error(OperationError::SessionNotFound);
        }
        let wishlist = self.wishlists.entry(user).or_default();
        let before = wishlist.len();
        wishlist.retain(|slot| *slot != session);
        OperationResult::Removed(wishlist.len() != before)
    }
}

fn non_empty<K: Ord + Copy, V: Clone>(lists: &BTreeMap<K, Vec<V>>) -> BTreeMap<K, Vec<V>> {
    lists
        .iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(key, list)| (*key, list.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_never_go_negative() {
        let mut model = ModelWorld::new(&[1], 0);

        let first = model.apply(&Operation::Register { user: 0, conference: 0 });
        let second = model.apply(&Operation::Register { user: 1, conference: 0 });

        assert_eq!(first, OperationResult::Ok);
        assert_eq!(second, OperationResult::Error(OperationError::SoldOut));
        assert_eq!(model.seats_available(0), Some(0));
    }

    #[test]
    fn unknown_slots_are_not_found() {
        let mut model = ModelWorld::new(&[3], 2);

        assert_eq!(
            model.apply(&Operation::Unregister { user: 0, conference: 1 }),
            OperationResult::Error(OperationError::ConferenceNotFound)
        );
        assert_eq!(
            model.apply(&Operation::AddToWishlist { user: 0, session: 2 }),
            OperationResult::Error(OperationError::SessionNotFound)
        );
    }

    #[test]
    fn observable_state_skips_empty_users() {
        let mut model = ModelWorld::new(&[3], 1);
        model.apply(&Operation::Register { user: 4, conference: 0 });
        model.apply(&Operation::Unregister { user: 4, conference: 0 });
        model.apply(&Operation::AddToWishlist { user: 2, session: 0 });

        let state = model.observable_state();
        assert_eq!(state.seats_available, vec![3]);
        assert!(state.registrations.is_empty());
        assert_eq!(state.wishlists.get(&2), Some(&vec![0]));
    }
}
