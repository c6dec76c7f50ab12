//! Conference payloads.

use serde::{Deserialize, Serialize};

/// Conference as sent and received by API clients.
///
/// Every field is optional on input. On output the server fills in the
/// derived fields (`month`, `seatsAvailable`, `websafeKey`,
/// `organizerUserId`, and `organizerDisplayName` where known).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceForm {
    /// Conference name (required on create)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Organizer's user id (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_user_id: Option<String>,
    /// Topic tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    /// Host city
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Start date, `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Month of the start date, 0 when unknown (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    /// Capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u32>,
    /// Remaining seats (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats_available: Option<u32>,
    /// End date, `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Websafe conference key (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websafe_key: Option<String>,
    /// Organizer's display name (output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_display_name: Option<String>,
}

/// A list of conferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceForms {
    /// Conferences in query order
    pub items: Vec<ConferenceForm>,
}

/// One user-supplied conference filter, e.g. `CITY EQ London`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceQueryForm {
    /// Logical field: `CITY`, `TOPIC`, `MONTH` or `MAX_ATTENDEES`
    pub field: String,
    /// Operator: `EQ`, `GT`, `GTEQ`, `LT`, `LTEQ` or `NE`
    pub operator: String,
    /// Comparison value, coerced per field
    pub value: String,
}

impl ConferenceQueryForm {
    /// Build a filter from its three parts.
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { field: field.into(), operator: operator.into(), value: value.into() }
    }
}

/// Ordered filters of a conference query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConferenceQueryForms {
    /// Filters, applied conjunctively
    pub filters: Vec<ConferenceQueryForm>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conference_form_uses_camel_case() {
        let form = ConferenceForm {
            name: Some("RustConf".to_string()),
            max_attendees: Some(10),
            ..Default::default()
        };

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["name"], "RustConf");
        assert_eq!(json["maxAttendees"], 10);
        assert!(json.get("seatsAvailable").is_none());
    }

    #[test]
    fn query_forms_accept_missing_filters() {
        let forms: ConferenceQueryForms = serde_json::from_str("{}").unwrap();
        assert!(forms.filters.is_empty());
    }
}
