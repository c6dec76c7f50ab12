//! Background side effects requested by API operations.
//!
//! Operations enqueue a [`Task`] after their write commits and return
//! without waiting. Dispatch is fire-and-forget: a dispatcher that cannot
//! accept a task logs and drops it, it never fails the request.

use crate::key::{ConferenceKey, SpeakerKey};

/// A deferred side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Confirm a newly created conference to its organizer.
    SendConfirmationEmail {
        /// Recipient
        email: String,
        /// The created conference
        conference: ConferenceKey,
        /// Conference name, for the message body
        conference_name: String,
    },

    /// Re-evaluate the featured speaker after a session was added.
    SetFeaturedSpeaker {
        /// Conference the session was added to
        conference: ConferenceKey,
        /// Speaker of the new session
        speaker: SpeakerKey,
    },

    /// Recompute the nearly-sold-out announcement.
    RefreshAnnouncement,
}

impl Task {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendConfirmationEmail { .. } => "send_confirmation_email",
            Self::SetFeaturedSpeaker { .. } => "set_featured_speaker",
            Self::RefreshAnnouncement => "refresh_announcement",
        }
    }
}

/// Accepts tasks for asynchronous execution.
pub trait TaskDispatcher: Send + Sync + 'static {
    /// Queue a task. Never blocks, never fails the caller.
    fn enqueue(&self, task: Task);
}
