//! Filter Compiler: user-supplied conference filters to a validated query.
//!
//! # Rules
//!
//! - Field names and operator symbols come from fixed tables
//! - At most one field may carry inequality filters; repeated inequalities on
//!   the same field are fine
//! - `MONTH` and `MAX_ATTENDEES` values are integers, everything else is text
//! - Results are ordered by the inequality field (if any), then by name
//!
//! Filters combine conjunctively. Contradicting equalities produce an empty
//! result, not an error.

use std::fmt;

use summit_proto::ConferenceQueryForm;
use thiserror::Error;

use crate::{
    entity::{Conference, ConferenceField},
    query::{Operator, Query, Value},
};

/// Errors from compiling conference filters. All are client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Unknown field name or operator symbol.
    #[error("filter contains invalid field or operator: {field} {operator}")]
    InvalidFilter {
        /// Field as supplied
        field: String,
        /// Operator as supplied
        operator: String,
    },

    /// Inequality filters on two different fields.
    #[error("inequality filter is allowed on only one field ({first} and {second})")]
    MultipleInequalityFields {
        /// Field of the first inequality filter
        first: FilterField,
        /// Offending field
        second: FilterField,
    },

    /// Value does not fit the field's type.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Field the value was supplied for
        field: FilterField,
        /// Value as supplied
        value: String,
    },
}

/// Logical fields a client may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    /// `CITY`
    City,
    /// `TOPIC`
    Topic,
    /// `MONTH`
    Month,
    /// `MAX_ATTENDEES`
    MaxAttendees,
}

impl FilterField {
    /// Stored property the field maps to.
    pub fn property(self) -> ConferenceField {
        match self {
            Self::City => ConferenceField::City,
            Self::Topic => ConferenceField::Topics,
            Self::Month => ConferenceField::Month,
            Self::MaxAttendees => ConferenceField::MaxAttendees,
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, Self::Month | Self::MaxAttendees)
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = FIELDS.iter().find(|(_, field)| field == self).map_or("?", |(name, _)| *name);
        f.write_str(name)
    }
}

/// Client field names.
pub const FIELDS: [(&str, FilterField); 4] = [
    ("CITY", FilterField::City),
    ("TOPIC", FilterField::Topic),
    ("MONTH", FilterField::Month),
    ("MAX_ATTENDEES", FilterField::MaxAttendees),
];

/// Client operator symbols.
pub const OPERATORS: [(&str, Operator); 6] = [
    ("EQ", Operator::Eq),
    ("GT", Operator::Gt),
    ("GTEQ", Operator::Ge),
    ("LT", Operator::Lt),
    ("LTEQ", Operator::Le),
    ("NE", Operator::Ne),
];

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table.iter().find(|(candidate, _)| *candidate == name).map(|(_, value)| *value)
}

/// Compile filters into a conference query.
///
/// # Errors
///
/// - `InvalidFilter` for an unknown field or operator
/// - `MultipleInequalityFields` when inequalities span two fields
/// - `InvalidValue` when an integer field gets a non-integer value
pub fn compile(filters: &[ConferenceQueryForm]) -> Result<Query<Conference>, FilterError> {
    let mut inequality: Option<FilterField> = None;
    let mut predicates = Vec::with_capacity(filters.len());

    for filter in filters {
        let invalid = || FilterError::InvalidFilter {
            field: filter.field.clone(),
            operator: filter.operator.clone(),
        };
        let field = lookup(&FIELDS, &filter.field).ok_or_else(invalid)?;
        let operator = lookup(&OPERATORS, &filter.operator).ok_or_else(invalid)?;

        if operator.is_inequality() {
            match inequality {
                Some(first) if first != field => {
                    return Err(FilterError::MultipleInequalityFields { first, second: field });
                },
                _ => inequality = Some(field),
            }
        }

        let value = if field.is_integer() {
            let parsed: i64 = filter.value.trim().parse().map_err(|_| FilterError::InvalidValue {
                field,
                value: filter.value.clone(),
            })?;
            Value::Int(parsed)
        } else {
            Value::Text(filter.value.clone())
        };

        predicates.push((field.property(), operator, value));
    }

    let mut query = Query::new();
    if let Some(field) = inequality {
        query = query.order_by(field.property());
    }
    query = query.order_by(ConferenceField::Name);

    for (field, operator, value) in predicates {
        query = query.filter(field, operator, value);
    }

    tracing::debug!(filters = filters.len(), ?inequality, "compiled conference query");
    Ok(query)
}
