//! Session payloads.

use serde::{Deserialize, Serialize};

/// Conference session as sent and received by API clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionForm {
    /// Session name (required on create)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Highlights shown in listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<String>,
    /// Websafe key of the speaker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_key: Option<String>,
    /// Speaker display name (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_display_name: Option<String>,
    /// Duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Session type tag, e.g. `workshop` or `keynote`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_of_session: Option<String>,
    /// Date, `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Start time, `HH:MM`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Websafe session key (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websafe_key: Option<String>,
    /// Websafe key of the owning conference (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websafe_conference_key: Option<String>,
    /// Name of the owning conference (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conference_name: Option<String>,
}

/// A list of sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionForms {
    /// Sessions in query order
    pub items: Vec<SessionForm>,
}
