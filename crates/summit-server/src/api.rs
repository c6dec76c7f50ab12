//! Every API operation, over a store, a cache and a task dispatcher.
//!
//! Operations accept websafe key strings and wire forms, validate them, and
//! work on structured keys and entities internally. Authorization is by the
//! explicit [`Caller`]. Side effects are enqueued only after the write they
//! depend on has committed.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use chrono::{Datelike, NaiveDate, NaiveTime};
use summit_core::{
    AnyKey, Caller, Conference, ConferenceKey, Ledger, Operator, Profile, Query, Session,
    SessionKey, Speaker, SpeakerKey, Store, Task, TaskDispatcher, UserId,
    announcement::{self, Cache},
    entity::{ConferenceField, SessionField, SpeakerField},
    filter,
    ledger::load_or_create_profile,
};
use summit_proto::{
    BooleanMessage, ConferenceForm, ConferenceForms, ConferenceQueryForms, ProfileForm,
    ProfileMiniForm, SessionForm, SessionForms, SpeakerForm, SpeakerForms, StringMessage,
};

use crate::error::{ApiError, ApiResult};

/// City of a conference created without one.
pub const DEFAULT_CITY: &str = "Default City";

/// Topics of a conference created without any.
pub const DEFAULT_TOPICS: [&str; 2] = ["Default", "Topic"];

/// The conference API.
pub struct ConferenceApi<S> {
    store: Arc<S>,
    cache: Arc<dyn Cache>,
    tasks: Arc<dyn TaskDispatcher>,
    ledger: Ledger<S>,
}

impl<S: Store> ConferenceApi<S> {
    /// Create the API over its collaborators.
    pub fn new(store: Arc<S>, cache: Arc<dyn Cache>, tasks: Arc<dyn TaskDispatcher>) -> Self {
        let ledger = Ledger::new(Arc::clone(&store));
        Self { store, cache, tasks, ledger }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The announcement cache.
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    // Conferences

    /// Create a conference organized by the caller.
    ///
    /// Missing city, topics and capacity take their defaults; seats start at
    /// capacity. Enqueues a confirmation e-mail.
    pub fn create_conference(
        &self,
        caller: &Caller,
        form: ConferenceForm,
    ) -> ApiResult<ConferenceForm> {
        let name = non_blank(form.name)
            .ok_or_else(|| ApiError::Validation("Conference 'name' field required".to_string()))?;
        let start_date = parse_optional_date(form.start_date.as_deref(), "startDate")?;
        let end_date = parse_optional_date(form.end_date.as_deref(), "endDate")?;
        check_dates(start_date, end_date)?;

        let topics = form
            .topics
            .filter(|topics| !topics.is_empty())
            .unwrap_or_else(|| DEFAULT_TOPICS.iter().map(ToString::to_string).collect());
        let max_attendees = form.max_attendees.unwrap_or(0);

        let key = ConferenceKey::new(caller.user_id.clone(), self.store.allocate_id()?);
        let conference = Conference {
            key: key.clone(),
            name,
            description: non_blank(form.description),
            city: non_blank(form.city).unwrap_or_else(|| DEFAULT_CITY.to_string()),
            topics,
            start_date,
            end_date,
            month: start_date.map_or(0, |date| date.month()),
            max_attendees,
            seats_available: max_attendees,
        };
        self.store.put(conference.clone())?;
        tracing::info!(conference = %key, organizer = %caller.user_id, "conference created");

        self.tasks.enqueue(Task::SendConfirmationEmail {
            email: caller.email.clone(),
            conference: key,
            conference_name: conference.name.clone(),
        });

        let organizer = self.caller_display_name(caller)?;
        Ok(conference_form(&conference, Some(organizer)))
    }

    /// Update a conference. Only the organizer may; only present, non-empty
    /// fields change.
    ///
    /// A new capacity keeps the registered attendees: seats become
    /// `new capacity - registered`, and a capacity below the registrations
    /// is a conflict.
    pub fn update_conference(
        &self,
        caller: &Caller,
        websafe_key: &str,
        form: ConferenceForm,
    ) -> ApiResult<ConferenceForm> {
        let key: ConferenceKey = websafe_key.parse()?;
        let start_date = parse_optional_date(form.start_date.as_deref(), "startDate")?;
        let end_date = parse_optional_date(form.end_date.as_deref(), "endDate")?;
        let ConferenceForm { name, description, topics, city, max_attendees, .. } = form;

        let conference = self.store.transaction(|txn| -> ApiResult<Conference> {
            let mut conference =
                txn.get::<Conference>(&key)?.ok_or_else(|| conference_not_found(&key))?;
            if conference.key.organizer != caller.user_id {
                return Err(ApiError::Authorization(
                    "Only the owner can update the conference.".to_string(),
                ));
            }

            if let Some(name) = non_blank(name) {
                conference.name = name;
            }
            if let Some(description) = non_blank(description) {
                conference.description = Some(description);
            }
            if let Some(city) = non_blank(city) {
                conference.city = city;
            }
            if let Some(topics) = topics.filter(|topics| !topics.is_empty()) {
                conference.topics = topics;
            }
            if let Some(date) = start_date {
                conference.start_date = Some(date);
                conference.month = date.month();
            }
            if let Some(date) = end_date {
                conference.end_date = Some(date);
            }
            check_dates(conference.start_date, conference.end_date)?;

            if let Some(max_attendees) = max_attendees {
                let registered = conference.registered();
                if max_attendees < registered {
                    return Err(ApiError::Conflict(format!(
                        "maxAttendees {max_attendees} is below the {registered} registered \
                         attendees"
                    )));
                }
                conference.max_attendees = max_attendees;
                conference.seats_available = max_attendees - registered;
            }

            txn.put(conference.clone())?;
            Ok(conference)
        })?;
        tracing::info!(conference = %key, "conference updated");

        let organizer = self.caller_display_name(caller)?;
        Ok(conference_form(&conference, Some(organizer)))
    }

    /// A conference with its organizer's display name.
    pub fn get_conference(&self, websafe_key: &str) -> ApiResult<ConferenceForm> {
        let key: ConferenceKey = websafe_key.parse()?;
        let conference = self.load_conference(&key)?;
        let organizer =
            self.store.get::<Profile>(&key.organizer)?.map(|profile| profile.display_name);
        Ok(conference_form(&conference, organizer))
    }

    /// Conferences matching client filters.
    pub fn query_conferences(&self, forms: &ConferenceQueryForms) -> ApiResult<ConferenceForms> {
        let query = filter::compile(&forms.filters)?;
        let conferences = self.store.query(&query)?;
        self.conference_forms(conferences)
    }

    /// Conferences organized by the caller, by name.
    pub fn conferences_created(&self, caller: &Caller) -> ApiResult<ConferenceForms> {
        let query = Query::<Conference>::new()
            .ancestor(AnyKey::Profile(caller.user_id.clone()))
            .order_by(ConferenceField::Name);
        let conferences = self.store.query(&query)?;
        self.conference_forms(conferences)
    }

    // Sessions

    /// Add a session to a conference. Only the conference organizer may.
    ///
    /// Enqueues a featured speaker check when the session has a speaker.
    pub fn create_session(
        &self,
        caller: &Caller,
        websafe_conference_key: &str,
        form: SessionForm,
    ) -> ApiResult<SessionForm> {
        let conference_key: ConferenceKey = websafe_conference_key.parse()?;
        let name = non_blank(form.name)
            .ok_or_else(|| ApiError::Validation("Session 'name' field required".to_string()))?;

        let conference = self.load_conference(&conference_key)?;
        if conference.key.organizer != caller.user_id {
            return Err(ApiError::Authorization(
                "Only the owner can add sessions to the conference.".to_string(),
            ));
        }

        let speaker = match non_blank(form.speaker_key) {
            Some(raw) => Some(self.load_speaker(&raw.parse()?)?),
            None => None,
        };
        let date = parse_optional_date(form.date.as_deref(), "date")?;
        let start_time = form.start_time.as_deref().map(parse_time).transpose()?;

        let key = SessionKey::new(conference_key.clone(), self.store.allocate_id()?);
        let session = Session {
            key: key.clone(),
            name,
            highlights: non_blank(form.highlights),
            speaker: speaker.as_ref().map(|speaker| speaker.key.clone()),
            duration_minutes: form.duration,
            type_of_session: non_blank(form.type_of_session),
            date,
            start_time,
        };
        self.store.put(session.clone())?;
        tracing::info!(session = %key, "session created");

        if let Some(speaker) = &speaker {
            self.tasks.enqueue(Task::SetFeaturedSpeaker {
                conference: conference_key,
                speaker: speaker.key.clone(),
            });
        }

        Ok(session_form(
            &session,
            Some(conference.name),
            speaker.map(|speaker| speaker.display_name),
        ))
    }

    /// Sessions of a conference, in creation order.
    pub fn conference_sessions(&self, websafe_conference_key: &str) -> ApiResult<SessionForms> {
        let key: ConferenceKey = websafe_conference_key.parse()?;
        self.load_conference(&key)?;
        let sessions =
            self.store.query(&Query::<Session>::new().ancestor(AnyKey::Conference(key)))?;
        self.session_forms(sessions)
    }

    /// Sessions of a conference with the given type.
    pub fn conference_sessions_by_type(
        &self,
        websafe_conference_key: &str,
        type_of_session: &str,
    ) -> ApiResult<SessionForms> {
        let key: ConferenceKey = websafe_conference_key.parse()?;
        self.load_conference(&key)?;
        let query = Query::<Session>::new().ancestor(AnyKey::Conference(key)).filter(
            SessionField::TypeOfSession,
            Operator::Eq,
            type_of_session,
        );
        let sessions = self.store.query(&query)?;
        self.session_forms(sessions)
    }

    /// Sessions given by a speaker, across all conferences.
    pub fn sessions_by_speaker(&self, websafe_speaker_key: &str) -> ApiResult<SessionForms> {
        let key: SpeakerKey = websafe_speaker_key.parse()?;
        self.load_speaker(&key)?;
        let query = Query::<Session>::new().filter(SessionField::Speaker, Operator::Eq, &key);
        let sessions = self.store.query(&query)?;
        self.session_forms(sessions)
    }

    /// Sessions of a conference starting before `start_time` (`HH:MM`),
    /// optionally excluding one session type, earliest first.
    ///
    /// Only one inequality runs in the store; the type exclusion is applied
    /// to the result. Sessions without a type are kept.
    pub fn sessions_before(
        &self,
        websafe_conference_key: &str,
        start_time: &str,
        exclude_type: Option<&str>,
    ) -> ApiResult<SessionForms> {
        let key: ConferenceKey = websafe_conference_key.parse()?;
        let start_time = parse_time(start_time)?;
        self.load_conference(&key)?;

        let query = Query::<Session>::new()
            .ancestor(AnyKey::Conference(key))
            .filter(SessionField::StartTime, Operator::Lt, start_time)
            .order_by(SessionField::StartTime);
        let sessions = self
            .store
            .query(&query)?
            .into_iter()
            .filter(|session| {
                exclude_type
                    .is_none_or(|excluded| session.type_of_session.as_deref() != Some(excluded))
            })
            .collect();
        self.session_forms(sessions)
    }

    // Speakers

    /// Create a speaker owned by the caller. Names are unique per owner.
    ///
    /// The uniqueness check runs outside a transaction, so it is best-effort
    /// when the same owner creates speakers concurrently.
    pub fn create_speaker(&self, caller: &Caller, form: SpeakerForm) -> ApiResult<SpeakerForm> {
        let display_name = non_blank(form.display_name).ok_or_else(|| {
            ApiError::Validation("Speaker 'displayName' field required".to_string())
        })?;

        let existing = Query::<Speaker>::new()
            .ancestor(AnyKey::Profile(caller.user_id.clone()))
            .filter(SpeakerField::DisplayName, Operator::Eq, display_name.as_str());
        if !self.store.query(&existing)?.is_empty() {
            return Err(ApiError::Conflict(format!(
                "A speaker named {display_name:?} already exists"
            )));
        }

        let key = SpeakerKey::new(caller.user_id.clone(), self.store.allocate_id()?);
        let speaker = Speaker { key: key.clone(), display_name };
        self.store.put(speaker.clone())?;
        tracing::info!(speaker = %key, "speaker created");
        Ok(speaker_form(&speaker))
    }

    /// One speaker.
    pub fn get_speaker(&self, websafe_key: &str) -> ApiResult<SpeakerForm> {
        let speaker = self.load_speaker(&websafe_key.parse()?)?;
        Ok(speaker_form(&speaker))
    }

    /// Speakers created by the caller, by name.
    pub fn speakers_created(&self, caller: &Caller) -> ApiResult<SpeakerForms> {
        let query = Query::<Speaker>::new()
            .ancestor(AnyKey::Profile(caller.user_id.clone()))
            .order_by(SpeakerField::DisplayName);
        let items = self.store.query(&query)?.iter().map(speaker_form).collect();
        Ok(SpeakerForms { items })
    }

    // Profiles

    /// The caller's profile, created and stored on first access.
    pub fn get_profile(&self, caller: &Caller) -> ApiResult<ProfileForm> {
        let profile = self.store.transaction(|txn| -> ApiResult<Profile> {
            if let Some(profile) = txn.get::<Profile>(&caller.user_id)? {
                return Ok(profile);
            }
            let profile = Profile::for_caller(caller);
            txn.put(profile.clone())?;
            tracing::info!(user = %caller.user_id, "profile created");
            Ok(profile)
        })?;
        Ok(profile_form(&profile))
    }

    /// Update display name and t-shirt size. Absent or empty values leave the
    /// stored fields unchanged.
    pub fn save_profile(&self, caller: &Caller, form: ProfileMiniForm) -> ApiResult<ProfileForm> {
        let ProfileMiniForm { display_name, tee_shirt_size } = form;
        let profile = self.store.transaction(|txn| -> ApiResult<Profile> {
            let mut profile = load_or_create_profile(txn, caller)?;
            if let Some(display_name) = non_blank(display_name) {
                profile.display_name = display_name;
            }
            if let Some(size) = tee_shirt_size {
                profile.tee_shirt_size = size;
            }
            txn.put(profile.clone())?;
            Ok(profile)
        })?;
        Ok(profile_form(&profile))
    }

    // Wishlist

    /// Add a session to the caller's wishlist.
    pub fn add_session_to_wishlist(
        &self,
        caller: &Caller,
        websafe_session_key: &str,
    ) -> ApiResult<BooleanMessage> {
        let key: SessionKey = websafe_session_key.parse()?;
        self.ledger.add_to_wishlist(caller, &key)?;
        Ok(BooleanMessage { data: true })
    }

    /// Remove a session from the caller's wishlist. `false` when it was not
    /// there.
    pub fn remove_session_from_wishlist(
        &self,
        caller: &Caller,
        websafe_session_key: &str,
    ) -> ApiResult<BooleanMessage> {
        let key: SessionKey = websafe_session_key.parse()?;
        let removed = self.ledger.remove_from_wishlist(caller, &key)?;
        Ok(BooleanMessage { data: removed })
    }

    /// Sessions in the caller's wishlist.
    pub fn sessions_in_wishlist(&self, caller: &Caller) -> ApiResult<SessionForms> {
        let sessions = self.ledger.wishlist(caller)?;
        self.session_forms(sessions)
    }

    // Registration

    /// Register the caller for a conference.
    pub fn register_for_conference(
        &self,
        caller: &Caller,
        websafe_key: &str,
    ) -> ApiResult<BooleanMessage> {
        let key: ConferenceKey = websafe_key.parse()?;
        self.ledger.register(caller, &key)?;
        self.tasks.enqueue(Task::RefreshAnnouncement);
        Ok(BooleanMessage { data: true })
    }

    /// Unregister the caller. `false` when they were not registered.
    pub fn unregister_from_conference(
        &self,
        caller: &Caller,
        websafe_key: &str,
    ) -> ApiResult<BooleanMessage> {
        let key: ConferenceKey = websafe_key.parse()?;
        let removed = self.ledger.unregister(caller, &key)?;
        self.tasks.enqueue(Task::RefreshAnnouncement);
        Ok(BooleanMessage { data: removed })
    }

    /// Conferences the caller is registered for.
    pub fn conferences_to_attend(&self, caller: &Caller) -> ApiResult<ConferenceForms> {
        let conferences = self.ledger.conferences_to_attend(caller)?;
        self.conference_forms(conferences)
    }

    // Announcements

    /// Cached nearly-sold-out announcement, empty when none.
    pub fn announcement(&self) -> StringMessage {
        StringMessage { data: announcement::announcement(self.cache.as_ref()) }
    }

    /// Cached featured speaker message, empty when none.
    pub fn featured_speaker(&self) -> StringMessage {
        StringMessage { data: announcement::featured_speaker(self.cache.as_ref()) }
    }

    /// Recompute and publish the announcement now.
    pub fn refresh_announcement(&self) -> ApiResult<StringMessage> {
        let data = announcement::refresh_announcement(self.store.as_ref(), self.cache.as_ref())?;
        Ok(StringMessage { data })
    }

    // Helpers

    fn load_conference(&self, key: &ConferenceKey) -> ApiResult<Conference> {
        self.store.get::<Conference>(key)?.ok_or_else(|| conference_not_found(key))
    }

    fn load_speaker(&self, key: &SpeakerKey) -> ApiResult<Speaker> {
        self.store
            .get::<Speaker>(key)?
            .ok_or_else(|| ApiError::NotFound(format!("No speaker found with key: {key}")))
    }

    fn caller_display_name(&self, caller: &Caller) -> ApiResult<String> {
        Ok(self
            .store
            .get::<Profile>(&caller.user_id)?
            .map_or_else(|| caller.nickname.clone(), |profile| profile.display_name))
    }

    fn conference_forms(&self, conferences: Vec<Conference>) -> ApiResult<ConferenceForms> {
        let organizers =
            unique(conferences.iter().map(|conference| conference.key.organizer.clone()));
        let names: BTreeMap<UserId, String> = self
            .store
            .get_multi::<Profile>(&organizers)?
            .into_iter()
            .flatten()
            .map(|profile| (profile.user_id, profile.display_name))
            .collect();

        let items = conferences
            .iter()
            .map(|conference| {
                conference_form(conference, names.get(&conference.key.organizer).cloned())
            })
            .collect();
        Ok(ConferenceForms { items })
    }

    fn session_forms(&self, sessions: Vec<Session>) -> ApiResult<SessionForms> {
        let conference_keys = unique(sessions.iter().map(|session| session.key.conference.clone()));
        let conference_names: BTreeMap<ConferenceKey, String> = self
            .store
            .get_multi::<Conference>(&conference_keys)?
            .into_iter()
            .flatten()
            .map(|conference| (conference.key, conference.name))
            .collect();

        let speaker_keys = unique(sessions.iter().filter_map(|session| session.speaker.clone()));
        let speaker_names: BTreeMap<SpeakerKey, String> = self
            .store
            .get_multi::<Speaker>(&speaker_keys)?
            .into_iter()
            .flatten()
            .map(|speaker| (speaker.key, speaker.display_name))
            .collect();

        let items = sessions
            .iter()
            .map(|session| {
                let conference = conference_names.get(&session.key.conference).cloned();
                let speaker =
                    session.speaker.as_ref().and_then(|key| speaker_names.get(key)).cloned();
                session_form(session, conference, speaker)
            })
            .collect();
        Ok(SessionForms { items })
    }
}

fn conference_not_found(key: &ConferenceKey) -> ApiError {
    ApiError::NotFound(format!("No conference found with key: {key}"))
}

fn unique<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Parse `YYYY-MM-DD`, reading only the first 10 characters so full
/// timestamps are accepted.
fn parse_date(raw: &str, field: &str) -> ApiResult<NaiveDate> {
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").map_err(|_| {
        ApiError::Validation(format!("'{field}' must be a YYYY-MM-DD date, got {raw:?}"))
    })
}

fn parse_optional_date(raw: Option<&str>, field: &str) -> ApiResult<Option<NaiveDate>> {
    raw.filter(|raw| !raw.trim().is_empty()).map(|raw| parse_date(raw, field)).transpose()
}

/// Parse `HH:MM`, ignoring any seconds.
fn parse_time(raw: &str) -> ApiResult<NaiveTime> {
    let prefix = raw.get(..5).unwrap_or(raw);
    NaiveTime::parse_from_str(prefix, "%H:%M")
        .map_err(|_| ApiError::Validation(format!("start time must be HH:MM, got {raw:?}")))
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ApiError::Validation(format!(
            "endDate {end} is before startDate {start}"
        ))),
        _ => Ok(()),
    }
}

fn conference_form(
    conference: &Conference,
    organizer_display_name: Option<String>,
) -> ConferenceForm {
    ConferenceForm {
        name: Some(conference.name.clone()),
        description: conference.description.clone(),
        organizer_user_id: Some(conference.key.organizer.to_string()),
        topics: Some(conference.topics.clone()),
        city: Some(conference.city.clone()),
        start_date: conference.start_date.map(|date| date.to_string()),
        month: Some(conference.month),
        max_attendees: Some(conference.max_attendees),
        seats_available: Some(conference.seats_available),
        end_date: conference.end_date.map(|date| date.to_string()),
        websafe_key: Some(conference.key.to_string()),
        organizer_display_name,
    }
}

fn session_form(
    session: &Session,
    conference_name: Option<String>,
    speaker_display_name: Option<String>,
) -> SessionForm {
    SessionForm {
        name: Some(session.name.clone()),
        highlights: session.highlights.clone(),
        speaker_key: session.speaker.as_ref().map(ToString::to_string),
        speaker_display_name,
        duration: session.duration_minutes,
        type_of_session: session.type_of_session.clone(),
        date: session.date.map(|date| date.to_string()),
        start_time: session.start_time.map(|time| time.format("%H:%M").to_string()),
        websafe_key: Some(session.key.to_string()),
        websafe_conference_key: Some(session.key.conference.to_string()),
        conference_name,
    }
}

fn speaker_form(speaker: &Speaker) -> SpeakerForm {
    SpeakerForm {
        display_name: Some(speaker.display_name.clone()),
        websafe_key: Some(speaker.key.to_string()),
    }
}

fn profile_form(profile: &Profile) -> ProfileForm {
    ProfileForm {
        display_name: profile.display_name.clone(),
        main_email: profile.main_email.clone(),
        tee_shirt_size: profile.tee_shirt_size,
        conference_keys_to_attend: profile
            .conference_keys_to_attend
            .iter()
            .map(ToString::to_string)
            .collect(),
        session_keys_wishlist: profile
            .session_keys_wishlist
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}
