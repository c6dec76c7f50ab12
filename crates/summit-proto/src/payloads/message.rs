//! Scalar response wrappers.

use serde::{Deserialize, Serialize};

/// Boolean result, e.g. whether an unregistration changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanMessage {
    /// The result
    pub data: bool,
}

/// String result, e.g. the current announcement. Empty when there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMessage {
    /// The result
    pub data: String,
}
