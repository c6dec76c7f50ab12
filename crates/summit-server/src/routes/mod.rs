//! HTTP route groups, one module per resource.

pub mod announcements;
pub mod conferences;
pub mod profile;
pub mod sessions;
pub mod speakers;
