//! Operations for model-based testing.
//!
//! Operations are generated randomly (by proptest or from raw bytes through
//! `arbitrary`) and applied to both the model and the real ledger.

use arbitrary::Arbitrary;
use summit_core::LedgerError;

/// User identifier. Every value names a distinct user.
pub type UserSlot = u8;

/// Conference index. Slots past the seeded conferences do not resolve.
pub type ConferenceSlot = u8;

/// Session index. Slots past the seeded sessions do not resolve.
pub type SessionSlot = u8;

/// Ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// User registers for a conference.
    Register {
        /// Registering user.
        user: UserSlot,
        /// Target conference.
        conference: ConferenceSlot,
    },

    /// User gives their seat back.
    Unregister {
        /// Unregistering user.
        user: UserSlot,
        /// Target conference.
        conference: ConferenceSlot,
    },

    /// User adds a session to their wishlist.
    AddToWishlist {
        /// Wishing user.
        user: UserSlot,
        /// Target session.
        session: SessionSlot,
    },

    /// User removes a session from their wishlist.
    RemoveFromWishlist {
        /// User.
        user: UserSlot,
        /// Target session.
        session: SessionSlot,
    },
}

impl Operation {
    /// The user performing the operation.
    pub fn user(&self) -> UserSlot {
        match *self {
            Self::Register { user, .. }
            | Self::Unregister { user, .. }
            | Self::AddToWishlist { user, .. }
            | Self::RemoveFromWishlist { user, .. } => user,
        }
    }
}

/// Result of applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Removal finished; `false` when there was nothing to remove.
    Removed(bool),

    /// Operation failed.
    Error(OperationError),
}

/// Errors an operation may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Conference slot does not resolve.
    ConferenceNotFound,

    /// Session slot does not resolve.
    SessionNotFound,

    /// User already holds a seat.
    AlreadyRegistered,

    /// No seats left.
    SoldOut,

    /// Session already wishlisted.
    AlreadyWishlisted,

    /// The store failed. Only the real side produces this.
    Unavailable,
}

impl From<&LedgerError> for OperationError {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::ConferenceNotFound(_) => Self::ConferenceNotFound,
            LedgerError::SessionNotFound(_) => Self::SessionNotFound,
            LedgerError::AlreadyRegistered => Self::AlreadyRegistered,
            LedgerError::SoldOut => Self::SoldOut,
            LedgerError::AlreadyWishlisted => Self::AlreadyWishlisted,
            LedgerError::Store(_) => Self::Unavailable,
        }
    }
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !self.is_err()
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Whether the store failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Error(OperationError::Unavailable))
    }
}
