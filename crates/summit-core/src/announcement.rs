//! Cached announcements: "nearly sold out" and "featured speaker".
//!
//! Both texts are computed from the store and published through a [`Cache`]
//! so read endpoints never query. The cache is a collaborator passed in by
//! the caller, never a global.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    entity::{AnyKey, Conference, ConferenceField, Session, SessionField, Speaker},
    env::Environment,
    key::{ConferenceKey, SpeakerKey},
    query::{Operator, Query},
    store::{Store, StoreError},
};

/// Cache key of the nearly-sold-out announcement.
pub const ANNOUNCEMENT_KEY: &str = "RECENT_ANNOUNCEMENTS";

/// Cache key of the featured speaker message.
pub const FEATURED_SPEAKER_KEY: &str = "FEATURED_SPEAKER";

/// Conferences with at most this many (but more than zero) seats left are
/// announced.
pub const NEARLY_SOLD_OUT_SEATS: u32 = 5;

/// Short-lived string cache.
///
/// Infallible: a cache that cannot serve a value behaves as if the value
/// expired.
pub trait Cache: Send + Sync + 'static {
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String);

    /// Current value, `None` when absent or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Remove `key`.
    fn delete(&self, key: &str);
}

/// Process-local cache with an optional time-to-live.
#[derive(Debug)]
pub struct MemoryCache<E: Environment> {
    env: E,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl<E: Environment> MemoryCache<E> {
    /// Create a cache. Entries older than `ttl` read as absent.
    pub fn new(env: E, ttl: Option<Duration>) -> Self {
        Self { env, ttl, entries: Mutex::new(HashMap::new()) }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, (String, Instant)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Environment> Cache for MemoryCache<E> {
    fn set(&self, key: &str, value: String) {
        let now = self.env.now();
        self.entries().insert(key.to_string(), (value, now));
    }

    fn get(&self, key: &str) -> Option<String> {
        let now = self.env.now();
        let mut entries = self.entries();
        let (value, stored_at) = entries.get(key)?;

        if self.ttl.is_some_and(|ttl| now.duration_since(*stored_at) >= ttl) {
            entries.remove(key);
            return None;
        }
        Some(value.clone())
    }

    fn delete(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Recompute the nearly-sold-out announcement and publish it.
///
/// Lists conferences with `0 < seats_available <= 5`, fewest seats first,
/// then by name. With no such conference the cache entry is deleted and the
/// empty string returned.
pub fn refresh_announcement<S, C>(store: &S, cache: &C) -> Result<String, StoreError>
where
    S: Store,
    C: Cache + ?Sized,
{
    let query = Query::<Conference>::new()
        .filter(ConferenceField::SeatsAvailable, Operator::Le, NEARLY_SOLD_OUT_SEATS)
        .filter(ConferenceField::SeatsAvailable, Operator::Gt, 0u32)
        .order_by(ConferenceField::SeatsAvailable)
        .order_by(ConferenceField::Name);
    let conferences = store.query(&query)?;

    if conferences.is_empty() {
        tracing::debug!("no conferences nearly sold out, clearing announcement");
        cache.delete(ANNOUNCEMENT_KEY);
        return Ok(String::new());
    }

    let names: Vec<&str> = conferences.iter().map(|conference| conference.name.as_str()).collect();
    let announcement = format!(
        "Last chance to attend! The following conferences are nearly sold out: {}",
        names.join(", ")
    );
    tracing::info!(conferences = conferences.len(), "announcement updated");
    cache.set(ANNOUNCEMENT_KEY, announcement.clone());
    Ok(announcement)
}

/// Publish `speaker` as the featured speaker when they hold more than one
/// session in `conference`.
///
/// Returns the published message, or `None` when the cache was left
/// untouched.
pub fn refresh_featured_speaker<S, C>(
    store: &S,
    cache: &C,
    conference: &ConferenceKey,
    speaker: &SpeakerKey,
) -> Result<Option<String>, StoreError>
where
    S: Store,
    C: Cache + ?Sized,
{
    let query = Query::<Session>::new()
        .ancestor(AnyKey::Conference(conference.clone()))
        .filter(SessionField::Speaker, Operator::Eq, speaker)
        .order_by(SessionField::Name);
    let sessions = store.query(&query)?;
    if sessions.len() < 2 {
        return Ok(None);
    }

    let Some(speaker) = store.get::<Speaker>(speaker)? else {
        tracing::warn!(%speaker, "featured speaker no longer resolves");
        return Ok(None);
    };

    let names: Vec<&str> = sessions.iter().map(|session| session.name.as_str()).collect();
    let message =
        format!("Featured speaker: {}. Sessions: {}", speaker.display_name, names.join(", "));
    tracing::info!(speaker = %speaker.key, sessions = sessions.len(), "featured speaker updated");
    cache.set(FEATURED_SPEAKER_KEY, message.clone());
    Ok(Some(message))
}

/// Current announcement, empty when none is cached.
pub fn announcement<C: Cache + ?Sized>(cache: &C) -> String {
    cache.get(ANNOUNCEMENT_KEY).unwrap_or_default()
}

/// Current featured speaker message, empty when none is cached.
pub fn featured_speaker<C: Cache + ?Sized>(cache: &C) -> String {
    cache.get(FEATURED_SPEAKER_KEY).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        key::{SessionKey, UserId},
        store::MemoryStore,
    };

    #[derive(Clone)]
    struct TestEnv {
        now: Arc<Mutex<Instant>>,
    }

    impl TestEnv {
        fn new() -> Self {
            Self { now: Arc::new(Mutex::new(Instant::now())) }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Environment for TestEnv {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }
    }

    fn organizer() -> UserId {
        UserId::new("organizer").unwrap()
    }

    fn add_conference(store: &MemoryStore, name: &str, max: u32, seats: u32) -> ConferenceKey {
        let key = ConferenceKey::new(organizer(), store.allocate_id().unwrap());
        store
            .put(Conference {
                key: key.clone(),
                name: name.into(),
                description: None,
                city: "Default City".into(),
                topics: vec![],
                start_date: None,
                end_date: None,
                month: 0,
                max_attendees: max,
                seats_available: seats,
            })
            .unwrap();
        key
    }

    fn add_session(
        store: &MemoryStore,
        conference: &ConferenceKey,
        name: &str,
        speaker: &SpeakerKey,
    ) {
        store
            .put(Session {
                key: SessionKey::new(conference.clone(), store.allocate_id().unwrap()),
                name: name.into(),
                highlights: None,
                speaker: Some(speaker.clone()),
                duration_minutes: None,
                type_of_session: None,
                date: None,
                start_time: None,
            })
            .unwrap();
    }

    #[test]
    fn announcement_lists_nearly_sold_out() {
        let store = MemoryStore::new();
        let cache = MemoryCache::new(TestEnv::new(), None);
        add_conference(&store, "Plenty", 100, 50);
        add_conference(&store, "Zeta", 10, 2);
        add_conference(&store, "Alpha", 10, 5);
        add_conference(&store, "Beta", 10, 2);
        add_conference(&store, "Full", 10, 0);

        let text = refresh_announcement(&store, &cache).unwrap();
        insta::assert_snapshot!(
            text,
            @"Last chance to attend! The following conferences are nearly sold out: Beta, Zeta, Alpha"
        );
        assert_eq!(announcement(&cache), text);
    }

    #[test]
    fn announcement_cleared_when_nothing_qualifies() {
        let store = MemoryStore::new();
        let cache = MemoryCache::new(TestEnv::new(), None);
        cache.set(ANNOUNCEMENT_KEY, "stale".into());
        add_conference(&store, "Plenty", 100, 50);

        assert_eq!(refresh_announcement(&store, &cache).unwrap(), "");
        assert_eq!(announcement(&cache), "");
    }

    #[test]
    fn featured_speaker_needs_two_sessions() {
        let store = MemoryStore::new();
        let cache = MemoryCache::new(TestEnv::new(), None);
        let conference = add_conference(&store, "RustConf", 10, 10);
        let speaker = SpeakerKey::new(organizer(), store.allocate_id().unwrap());
        store.put(Speaker { key: speaker.clone(), display_name: "Ada".into() }).unwrap();

        add_session(&store, &conference, "Unsafe", &speaker);
        assert_eq!(refresh_featured_speaker(&store, &cache, &conference, &speaker).unwrap(), None);
        assert_eq!(featured_speaker(&cache), "");

        add_session(&store, &conference, "Lifetimes", &speaker);
        refresh_featured_speaker(&store, &cache, &conference, &speaker).unwrap();
        insta::assert_snapshot!(
            featured_speaker(&cache),
            @"Featured speaker: Ada. Sessions: Lifetimes, Unsafe"
        );
    }

    #[test]
    fn entries_expire_after_ttl() {
        let env = TestEnv::new();
        let cache = MemoryCache::new(env.clone(), Some(Duration::from_secs(60)));
        cache.set("k", "v".into());

        env.advance(Duration::from_secs(59));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        env.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k"), None);
    }
}
