//! Request and response payloads, grouped by resource.

pub mod conference;
pub mod message;
pub mod profile;
pub mod session;
pub mod speaker;
