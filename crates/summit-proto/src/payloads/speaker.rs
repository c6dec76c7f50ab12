//! Speaker payloads.

use serde::{Deserialize, Serialize};

/// Speaker as sent and received by API clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeakerForm {
    /// Display name, unique among the creator's speakers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Websafe speaker key (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websafe_key: Option<String>,
}

/// A list of speakers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerForms {
    /// Speakers in query order
    pub items: Vec<SpeakerForm>,
}
