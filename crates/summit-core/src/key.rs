//! Structured entity keys.
//!
//! Every entity except [`Profile`](crate::entity::Profile) is addressed by a
//! store-allocated id plus its parent key. Inside the system keys are always
//! structured; the websafe string form only exists at the API boundary:
//!
//! ```text
//! conf:{id}:{organizer}
//! sess:{id}:{conference id}:{organizer}
//! spkr:{id}:{owner}
//! ```
//!
//! The user id is always the last segment, so it may itself contain `:`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFERENCE_PREFIX: &str = "conf";
const SESSION_PREFIX: &str = "sess";
const SPEAKER_PREFIX: &str = "spkr";

/// Errors from parsing websafe key strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The string does not have the shape of the expected key kind.
    #[error("malformed {kind} key: {raw:?}")]
    Malformed {
        /// Expected key kind
        kind: &'static str,
        /// The rejected input
        raw: String,
    },

    /// User ids must be non-empty.
    #[error("user id must not be empty")]
    EmptyUserId,
}

/// Authenticated user identifier. Doubles as the profile key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a user id.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::EmptyUserId` for an empty (or all-whitespace) id.
    pub fn new(id: impl Into<String>) -> Result<Self, KeyError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(KeyError::EmptyUserId);
        }
        Ok(Self(id))
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of a conference, parented to the organizer's profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConferenceKey {
    /// Organizer (parent profile)
    pub organizer: UserId,
    /// Store-allocated id
    pub id: u64,
}

/// Key of a session, parented to its conference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionKey {
    /// Owning conference
    pub conference: ConferenceKey,
    /// Store-allocated id
    pub id: u64,
}

/// Key of a speaker, parented to the profile of the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpeakerKey {
    /// Creating user (parent profile)
    pub owner: UserId,
    /// Store-allocated id
    pub id: u64,
}

impl ConferenceKey {
    /// Build a conference key.
    pub fn new(organizer: UserId, id: u64) -> Self {
        Self { organizer, id }
    }
}

impl SessionKey {
    /// Build a session key.
    pub fn new(conference: ConferenceKey, id: u64) -> Self {
        Self { conference, id }
    }
}

impl SpeakerKey {
    /// Build a speaker key.
    pub fn new(owner: UserId, id: u64) -> Self {
        Self { owner, id }
    }
}

impl fmt::Display for ConferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CONFERENCE_PREFIX}:{}:{}", self.id, self.organizer)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SESSION_PREFIX}:{}:{}:{}",
            self.id, self.conference.id, self.conference.organizer
        )
    }
}

impl fmt::Display for SpeakerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SPEAKER_PREFIX}:{}:{}", self.id, self.owner)
    }
}

/// Split `raw` into `N` numeric ids followed by a trailing user id, after
/// checking the kind prefix.
fn split_key<const N: usize>(
    raw: &str,
    prefix: &str,
    kind: &'static str,
) -> Result<([u64; N], UserId), KeyError> {
    let malformed = || KeyError::Malformed { kind, raw: raw.to_string() };

    let mut parts = raw.splitn(N + 2, ':');
    if parts.next() != Some(prefix) {
        return Err(malformed());
    }

    let mut ids = [0u64; N];
    for slot in &mut ids {
        *slot = parts.next().and_then(|part| part.parse().ok()).ok_or_else(malformed)?;
    }

    let user = parts.next().ok_or_else(malformed)?;
    let user = UserId::new(user).map_err(|_| malformed())?;
    Ok((ids, user))
}

impl FromStr for ConferenceKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let ([id], organizer) = split_key::<1>(raw, CONFERENCE_PREFIX, "conference")?;
        Ok(Self { organizer, id })
    }
}

impl FromStr for SessionKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let ([id, conference_id], organizer) = split_key::<2>(raw, SESSION_PREFIX, "session")?;
        Ok(Self { conference: ConferenceKey { organizer, id: conference_id }, id })
    }
}

impl FromStr for SpeakerKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let ([id], owner) = split_key::<1>(raw, SPEAKER_PREFIX, "speaker")?;
        Ok(Self { owner, id })
    }
}

macro_rules! string_conversions {
    ($($key:ty),* $(,)?) => {
        $(
            impl TryFrom<String> for $key {
                type Error = KeyError;

                fn try_from(raw: String) -> Result<Self, Self::Error> {
                    raw.parse()
                }
            }

            impl From<$key> for String {
                fn from(key: $key) -> Self {
                    key.to_string()
                }
            }
        )*
    };
}

string_conversions!(ConferenceKey, SessionKey, SpeakerKey);
