//! Typed record queries: ancestor scope, predicates and ordering.
//!
//! A [`Query`] is evaluated against records of a single kind. Predicates on
//! multi-valued properties match when any value satisfies them. Values of
//! different variants never compare equal and never order against each
//! other, so a text filter on an integer property simply matches nothing.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};

use crate::{
    entity::{AnyKey, Record},
    key::{ConferenceKey, SessionKey, SpeakerKey},
};

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Integer
    Int(i64),
    /// Text
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Websafe key string
    Key(String),
}

impl Value {
    /// Compare two values of the same variant. `None` across variants.
    pub fn partial_compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Key(a), Self::Key(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<&ConferenceKey> for Value {
    fn from(value: &ConferenceKey) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<&SessionKey> for Value {
    fn from(value: &SessionKey) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<&SpeakerKey> for Value {
    fn from(value: &SpeakerKey) -> Self {
        Self::Key(value.to_string())
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `!=`
    Ne,
}

impl Operator {
    /// Everything except equality restricts a range.
    pub fn is_inequality(self) -> bool {
        !matches!(self, Self::Eq)
    }

    /// Whether `actual <op> expected` holds.
    pub fn test(self, actual: &Value, expected: &Value) -> bool {
        let Some(ordering) = actual.partial_compare(expected) else {
            return false;
        };
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Ne => ordering != Ordering::Equal,
        }
    }
}

/// One `field <op> value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate<F> {
    /// Property under test
    pub field: F,
    /// Operator
    pub operator: Operator,
    /// Right-hand side
    pub value: Value,
}

/// A query over records of kind `R`.
#[derive(Debug, Clone)]
pub struct Query<R: Record> {
    ancestor: Option<AnyKey>,
    predicates: Vec<Predicate<R::Field>>,
    order: Vec<R::Field>,
}

impl<R: Record> Default for Query<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Query<R> {
    /// Match every record of the kind.
    pub fn new() -> Self {
        Self { ancestor: None, predicates: Vec::new(), order: Vec::new() }
    }

    /// Restrict to descendants of `ancestor`.
    #[must_use]
    pub fn ancestor(mut self, ancestor: AnyKey) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Add a predicate.
    #[must_use]
    pub fn filter(mut self, field: R::Field, operator: Operator, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate { field, operator, value: value.into() });
        self
    }

    /// Append an ascending sort field.
    #[must_use]
    pub fn order_by(mut self, field: R::Field) -> Self {
        self.order.push(field);
        self
    }

    /// Ancestor scope.
    pub fn ancestor_key(&self) -> Option<&AnyKey> {
        self.ancestor.as_ref()
    }

    /// Predicates in insertion order.
    pub fn predicates(&self) -> &[Predicate<R::Field>] {
        &self.predicates
    }

    /// Sort fields, most significant first.
    pub fn order(&self) -> &[R::Field] {
        &self.order
    }

    /// Whether `record` belongs in the result set.
    ///
    /// Records missing a sort property are excluded, as are records outside
    /// the ancestor scope.
    pub fn matches(&self, record: &R) -> bool {
        if let Some(ancestor) = &self.ancestor {
            if !R::wrap_key(record.key().clone()).has_ancestor(ancestor) {
                return false;
            }
        }

        let predicates_hold = self.predicates.iter().all(|predicate| {
            record
                .property(predicate.field)
                .iter()
                .any(|actual| predicate.operator.test(actual, &predicate.value))
        });

        predicates_hold && self.order.iter().all(|field| !record.property(*field).is_empty())
    }

    /// Result ordering: sort fields by their smallest value, then key.
    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        for field in &self.order {
            let left = min_value(a.property(*field));
            let right = min_value(b.property(*field));
            let ordering = match (left, right) {
                (Some(left), Some(right)) => {
                    left.partial_compare(&right).unwrap_or(Ordering::Equal)
                },
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.key().cmp(b.key())
    }

    /// Filter and sort a candidate set.
    pub fn apply(&self, records: impl IntoIterator<Item = R>) -> Vec<R> {
        let mut matched: Vec<R> =
            records.into_iter().filter(|record| self.matches(record)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }
}

fn min_value(values: Vec<Value>) -> Option<Value> {
    values.into_iter().reduce(|min, value| match value.partial_compare(&min) {
        Some(Ordering::Less) => value,
        _ => min,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::{Conference, ConferenceField},
        key::UserId,
    };

    fn conference(id: u64, name: &str, city: &str, topics: &[&str], seats: u32) -> Conference {
        Conference {
            key: ConferenceKey::new(UserId::new("ada").unwrap(), id),
            name: name.to_string(),
            description: None,
            city: city.to_string(),
            topics: topics.iter().map(|t| (*t).to_string()).collect(),
            start_date: None,
            end_date: None,
            month: 0,
            max_attendees: 10,
            seats_available: seats,
        }
    }

    #[test]
    fn operators_follow_ordering() {
        let three = Value::Int(3);
        let five = Value::Int(5);
        assert!(Operator::Lt.test(&three, &five));
        assert!(Operator::Le.test(&five, &five));
        assert!(Operator::Ge.test(&five, &three));
        assert!(!Operator::Gt.test(&five, &five));
        assert!(Operator::Ne.test(&three, &five));
    }

    #[test]
    fn mismatched_variants_never_match() {
        let int = Value::Int(3);
        let text = Value::from("3");
        for op in [Operator::Eq, Operator::Ne, Operator::Lt, Operator::Gt] {
            assert!(!op.test(&int, &text));
        }
    }

    #[test]
    fn multi_valued_property_matches_any_element() {
        let query =
            Query::<Conference>::new().filter(ConferenceField::Topics, Operator::Eq, "Rust");
        assert!(query.matches(&conference(1, "A", "Paris", &["Go", "Rust"], 1)));
        assert!(!query.matches(&conference(2, "B", "Paris", &["Go"], 1)));
        assert!(!query.matches(&conference(3, "C", "Paris", &[], 1)));
    }

    #[test]
    fn ordering_uses_fields_then_key() {
        let query = Query::<Conference>::new()
            .order_by(ConferenceField::SeatsAvailable)
            .order_by(ConferenceField::Name);
        let result = query.apply(vec![
            conference(1, "B", "Paris", &[], 2),
            conference(2, "A", "Paris", &[], 2),
            conference(3, "Z", "Paris", &[], 1),
            conference(4, "A", "Paris", &[], 2),
        ]);
        let ids: Vec<u64> = result.iter().map(|c| c.key.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn records_missing_sort_property_are_excluded() {
        let query = Query::<Conference>::new().order_by(ConferenceField::StartDate);
        assert!(query.apply(vec![conference(1, "A", "Paris", &[], 1)]).is_empty());
    }

    #[test]
    fn ancestor_scope_filters_other_organizers() {
        let grace = UserId::new("grace").unwrap();
        let query = Query::<Conference>::new().ancestor(AnyKey::Profile(grace));
        assert!(!query.matches(&conference(1, "A", "Paris", &[], 1)));
    }
}
