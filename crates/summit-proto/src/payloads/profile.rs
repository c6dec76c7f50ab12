//! Profile payloads.
//!
//! The profile carries the user's e-mail address, so [`ProfileForm`] has a
//! hand-written `Debug` that keeps it out of logs.

use serde::{Deserialize, Serialize};

/// T-shirt size, split by cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum TeeShirtSize {
    #[default]
    NotSpecified,
    XsM,
    XsW,
    SM,
    SW,
    MM,
    MW,
    LM,
    LW,
    XlM,
    XlW,
    XxlM,
    XxlW,
    XxxlM,
    XxxlW,
}

/// Full profile returned by the API.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    /// Display name
    pub display_name: String,
    /// Main e-mail address
    pub main_email: String,
    /// T-shirt size
    pub tee_shirt_size: TeeShirtSize,
    /// Websafe keys of the conferences the user attends, in registration order
    pub conference_keys_to_attend: Vec<String>,
    /// Websafe keys of wishlisted sessions, in insertion order
    pub session_keys_wishlist: Vec<String>,
}

impl std::fmt::Debug for ProfileForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileForm")
            .field("display_name", &self.display_name)
            .field("main_email", &format!("<redacted {} bytes>", self.main_email.len()))
            .field("tee_shirt_size", &self.tee_shirt_size)
            .field("conference_keys_to_attend", &self.conference_keys_to_attend)
            .field("session_keys_wishlist", &self.session_keys_wishlist)
            .finish()
    }
}

/// User-editable subset of the profile.
///
/// Absent or empty fields leave the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileMiniForm {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New t-shirt size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tee_shirt_size: Option<TeeShirtSize>,
}
