//! Stored entities and the type-erased record envelope.
//!
//! The store keeps heterogeneous records in one ordered map, so every entity
//! converts into [`AnyRecord`] and every key into [`AnyKey`]. The [`Record`]
//! trait ties the typed and erased views together and exposes the queryable
//! properties of each kind.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use summit_proto::TeeShirtSize;

use crate::{
    caller::Caller,
    key::{ConferenceKey, SessionKey, SpeakerKey, UserId},
    query::Value,
};

/// Entity kinds known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// [`Profile`]
    Profile,
    /// [`Conference`]
    Conference,
    /// [`Session`]
    Session,
    /// [`Speaker`]
    Speaker,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Profile => "Profile",
            Self::Conference => "Conference",
            Self::Session => "Session",
            Self::Speaker => "Speaker",
        };
        f.write_str(name)
    }
}

/// A key of any kind.
///
/// Ordering groups keys by kind first, which keeps scans of one kind
/// contiguous.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnyKey {
    /// Profile key
    Profile(UserId),
    /// Conference key
    Conference(ConferenceKey),
    /// Session key
    Session(SessionKey),
    /// Speaker key
    Speaker(SpeakerKey),
}

impl AnyKey {
    /// Kind of the addressed entity.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Profile(_) => Kind::Profile,
            Self::Conference(_) => Kind::Conference,
            Self::Session(_) => Kind::Session,
            Self::Speaker(_) => Kind::Speaker,
        }
    }

    /// Parent key, `None` for root (profile) keys.
    pub fn parent(&self) -> Option<Self> {
        match self {
            Self::Profile(_) => None,
            Self::Conference(key) => Some(Self::Profile(key.organizer.clone())),
            Self::Session(key) => Some(Self::Conference(key.conference.clone())),
            Self::Speaker(key) => Some(Self::Profile(key.owner.clone())),
        }
    }

    /// Whether `ancestor` appears anywhere in this key's parent chain.
    pub fn has_ancestor(&self, ancestor: &Self) -> bool {
        let mut current = self.parent();
        while let Some(key) = current {
            if &key == ancestor {
                return true;
            }
            current = key.parent();
        }
        false
    }
}

impl fmt::Display for AnyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(key) => write!(f, "profile:{key}"),
            Self::Conference(key) => key.fmt(f),
            Self::Session(key) => key.fmt(f),
            Self::Speaker(key) => key.fmt(f),
        }
    }
}

/// A record of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyRecord {
    /// Profile record
    Profile(Profile),
    /// Conference record
    Conference(Conference),
    /// Session record
    Session(Session),
    /// Speaker record
    Speaker(Speaker),
}

impl AnyRecord {
    /// Kind of the record.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Profile(_) => Kind::Profile,
            Self::Conference(_) => Kind::Conference,
            Self::Session(_) => Kind::Session,
            Self::Speaker(_) => Kind::Speaker,
        }
    }

    /// Type-erased key of the record.
    pub fn key(&self) -> AnyKey {
        match self {
            Self::Profile(record) => AnyKey::Profile(record.user_id.clone()),
            Self::Conference(record) => AnyKey::Conference(record.key.clone()),
            Self::Session(record) => AnyKey::Session(record.key.clone()),
            Self::Speaker(record) => AnyKey::Speaker(record.key.clone()),
        }
    }
}

/// A typed entity that can live in the store.
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Typed key.
    type Key: Clone + fmt::Debug + fmt::Display + Eq + Ord + Send + Sync;

    /// Queryable properties.
    type Field: Copy + fmt::Debug + Eq + Send + Sync;

    /// Kind tag.
    const KIND: Kind;

    /// The record's key.
    fn key(&self) -> &Self::Key;

    /// Values of a property. Multi-valued properties return every element;
    /// unset properties return nothing.
    fn property(&self, field: Self::Field) -> Vec<Value>;

    /// Erase a typed key.
    fn wrap_key(key: Self::Key) -> AnyKey;

    /// Erase the record.
    fn into_any(self) -> AnyRecord;

    /// Recover the typed record, `None` on a kind mismatch.
    fn from_any(record: AnyRecord) -> Option<Self>;
}

/// Per-user profile. Keyed by the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner (and key)
    pub user_id: UserId,
    /// Display name
    pub display_name: String,
    /// Main e-mail address
    pub main_email: String,
    /// T-shirt size
    pub tee_shirt_size: TeeShirtSize,
    /// Conferences the user registered for, in registration order, no
    /// duplicates
    pub conference_keys_to_attend: Vec<ConferenceKey>,
    /// Wishlisted sessions, in insertion order, no duplicates
    pub session_keys_wishlist: Vec<SessionKey>,
}

impl Profile {
    /// Fresh profile for a first-time caller.
    pub fn for_caller(caller: &Caller) -> Self {
        Self {
            user_id: caller.user_id.clone(),
            display_name: caller.nickname.clone(),
            main_email: caller.email.clone(),
            tee_shirt_size: TeeShirtSize::NotSpecified,
            conference_keys_to_attend: Vec::new(),
            session_keys_wishlist: Vec::new(),
        }
    }

    /// Whether the user is registered for `conference`.
    pub fn is_attending(&self, conference: &ConferenceKey) -> bool {
        self.conference_keys_to_attend.contains(conference)
    }
}

/// Queryable profile properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    /// Display name
    DisplayName,
}

impl Record for Profile {
    type Key = UserId;
    type Field = ProfileField;

    const KIND: Kind = Kind::Profile;

    fn key(&self) -> &Self::Key {
        &self.user_id
    }

    fn property(&self, field: Self::Field) -> Vec<Value> {
        match field {
            ProfileField::DisplayName => vec![Value::from(self.display_name.as_str())],
        }
    }

    fn wrap_key(key: Self::Key) -> AnyKey {
        AnyKey::Profile(key)
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Profile(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Profile(record) => Some(record),
            _ => None,
        }
    }
}

/// A conference, parented to its organizer.
///
/// # Invariants
///
/// - `seats_available <= max_attendees`; the unsigned type rules out
///   negative counts
/// - `month` is the month of `start_date`, or 0 without a start date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    /// Key (organizer + id)
    pub key: ConferenceKey,
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Host city
    pub city: String,
    /// Topic tags
    pub topics: Vec<String>,
    /// First day
    pub start_date: Option<NaiveDate>,
    /// Last day
    pub end_date: Option<NaiveDate>,
    /// Start month, 0 when unknown
    pub month: u32,
    /// Capacity
    pub max_attendees: u32,
    /// Remaining seats
    pub seats_available: u32,
}

impl Conference {
    /// Organizer's user id.
    pub fn organizer(&self) -> &UserId {
        &self.key.organizer
    }

    /// Number of registered attendees.
    pub fn registered(&self) -> u32 {
        self.max_attendees.saturating_sub(self.seats_available)
    }
}

/// Queryable conference properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConferenceField {
    /// Name
    Name,
    /// Host city
    City,
    /// Topic tags (multi-valued)
    Topics,
    /// Start month
    Month,
    /// Capacity
    MaxAttendees,
    /// Remaining seats
    SeatsAvailable,
    /// First day
    StartDate,
    /// Organizer user id
    Organizer,
}

impl Record for Conference {
    type Key = ConferenceKey;
    type Field = ConferenceField;

    const KIND: Kind = Kind::Conference;

    fn key(&self) -> &Self::Key {
        &self.key
    }

    fn property(&self, field: Self::Field) -> Vec<Value> {
        match field {
            ConferenceField::Name => vec![Value::from(self.name.as_str())],
            ConferenceField::City => vec![Value::from(self.city.as_str())],
            ConferenceField::Topics => {
                self.topics.iter().map(|topic| Value::from(topic.as_str())).collect()
            },
            ConferenceField::Month => vec![Value::from(self.month)],
            ConferenceField::MaxAttendees => vec![Value::from(self.max_attendees)],
            ConferenceField::SeatsAvailable => vec![Value::from(self.seats_available)],
            ConferenceField::StartDate => self.start_date.map(Value::from).into_iter().collect(),
            ConferenceField::Organizer => vec![Value::from(self.key.organizer.as_str())],
        }
    }

    fn wrap_key(key: Self::Key) -> AnyKey {
        AnyKey::Conference(key)
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Conference(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Conference(record) => Some(record),
            _ => None,
        }
    }
}

/// A session within a conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Key (conference + id)
    pub key: SessionKey,
    /// Name
    pub name: String,
    /// Highlights
    pub highlights: Option<String>,
    /// Speaker, if assigned
    pub speaker: Option<SpeakerKey>,
    /// Duration in minutes
    pub duration_minutes: Option<u32>,
    /// Session type tag
    pub type_of_session: Option<String>,
    /// Day of the session
    pub date: Option<NaiveDate>,
    /// Start time
    pub start_time: Option<NaiveTime>,
}

impl Session {
    /// Conference the session belongs to.
    pub fn conference(&self) -> &ConferenceKey {
        &self.key.conference
    }
}

/// Queryable session properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    /// Name
    Name,
    /// Session type tag
    TypeOfSession,
    /// Speaker key
    Speaker,
    /// Day
    Date,
    /// Start time
    StartTime,
}

impl Record for Session {
    type Key = SessionKey;
    type Field = SessionField;

    const KIND: Kind = Kind::Session;

    fn key(&self) -> &Self::Key {
        &self.key
    }

    fn property(&self, field: Self::Field) -> Vec<Value> {
        match field {
            SessionField::Name => vec![Value::from(self.name.as_str())],
            SessionField::TypeOfSession => {
                self.type_of_session.as_deref().map(Value::from).into_iter().collect()
            },
            SessionField::Speaker => self.speaker.as_ref().map(Value::from).into_iter().collect(),
            SessionField::Date => self.date.map(Value::from).into_iter().collect(),
            SessionField::StartTime => self.start_time.map(Value::from).into_iter().collect(),
        }
    }

    fn wrap_key(key: Self::Key) -> AnyKey {
        AnyKey::Session(key)
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Session(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Session(record) => Some(record),
            _ => None,
        }
    }
}

/// A speaker, parented to the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Key (owner + id)
    pub key: SpeakerKey,
    /// Display name, unique among the owner's speakers
    pub display_name: String,
}

/// Queryable speaker properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerField {
    /// Display name
    DisplayName,
}

impl Record for Speaker {
    type Key = SpeakerKey;
    type Field = SpeakerField;

    const KIND: Kind = Kind::Speaker;

    fn key(&self) -> &Self::Key {
        &self.key
    }

    fn property(&self, field: Self::Field) -> Vec<Value> {
        match field {
            SpeakerField::DisplayName => vec![Value::from(self.display_name.as_str())],
        }
    }

    fn wrap_key(key: Self::Key) -> AnyKey {
        AnyKey::Speaker(key)
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Speaker(self)
    }

    fn from_any(record: AnyRecord) -> Option<Self> {
        match record {
            AnyRecord::Speaker(record) => Some(record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn session_key_chains_to_organizer() {
        let conference = ConferenceKey::new(user("ada"), 1);
        let session = AnyKey::Session(SessionKey::new(conference.clone(), 2));

        assert!(session.has_ancestor(&AnyKey::Conference(conference)));
        assert!(session.has_ancestor(&AnyKey::Profile(user("ada"))));
        assert!(!session.has_ancestor(&AnyKey::Profile(user("grace"))));
        assert!(!session.has_ancestor(&session));
    }

    #[test]
    fn conference_topics_are_multi_valued() {
        let conference = Conference {
            key: ConferenceKey::new(user("ada"), 1),
            name: "RustConf".to_string(),
            description: None,
            city: "Portland".to_string(),
            topics: vec!["Rust".to_string(), "Systems".to_string()],
            start_date: None,
            end_date: None,
            month: 0,
            max_attendees: 10,
            seats_available: 4,
        };

        assert_eq!(conference.property(ConferenceField::Topics).len(), 2);
        assert!(conference.property(ConferenceField::StartDate).is_empty());
        assert_eq!(conference.registered(), 6);
    }

    #[test]
    fn kind_mismatch_is_detected() {
        let speaker = Speaker { key: SpeakerKey::new(user("ada"), 3), display_name: "Ada".into() };
        assert!(Conference::from_any(speaker.clone().into_any()).is_none());
        assert_eq!(Speaker::from_any(speaker.clone().into_any()), Some(speaker));
    }
}
