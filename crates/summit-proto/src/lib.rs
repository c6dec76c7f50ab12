//! Summit API payloads.
//!
//! Plain serde types exchanged between API clients and the server. Keys
//! travel as websafe strings; parsing them into structured keys is the
//! server's job.
//!
//! ## Layout
//!
//! ```text
//! summit-proto
//!   ├─ conference   (ConferenceForm, ConferenceQueryForm)
//!   ├─ session      (SessionForm)
//!   ├─ speaker      (SpeakerForm)
//!   ├─ profile      (ProfileForm, ProfileMiniForm, TeeShirtSize)
//!   └─ message      (BooleanMessage, StringMessage)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod payloads;

pub use payloads::{
    conference::{ConferenceForm, ConferenceForms, ConferenceQueryForm, ConferenceQueryForms},
    message::{BooleanMessage, StringMessage},
    profile::{ProfileForm, ProfileMiniForm, TeeShirtSize},
    session::{SessionForm, SessionForms},
    speaker::{SpeakerForm, SpeakerForms},
};
