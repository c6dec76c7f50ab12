//! Authenticated caller passed explicitly into every operation.

use crate::key::UserId;

/// Identity of the authenticated user making a request.
///
/// Authentication itself happens upstream; operations receive the result
/// instead of looking up an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Stable user id (also the profile key)
    pub user_id: UserId,
    /// E-mail address, used for the default profile and confirmations
    pub email: String,
    /// Nickname, used as the default display name
    pub nickname: String,
}

impl Caller {
    /// Create a caller. An empty nickname falls back to the user id.
    pub fn new(user_id: UserId, email: impl Into<String>, nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        let nickname = if nickname.trim().is_empty() { user_id.to_string() } else { nickname };
        Self { user_id, email: email.into(), nickname }
    }
}
