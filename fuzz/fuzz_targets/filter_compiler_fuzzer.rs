//! Fuzz target for the conference filter compiler
//!
//! # Strategy
//!
//! - Field names: mostly known names, sometimes arbitrary strings
//! - Operators: mostly known symbols, sometimes arbitrary strings
//! - Values: integers, integer-looking strings with padding, free text
//!
//! # Invariants
//!
//! - NEVER panic, whatever the input
//! - Accepted filter lists use at most one inequality field
//! - Accepted queries keep one predicate per filter
//! - Ordering starts with the inequality field (if any) and ends with name
//! - Two distinct inequality fields MUST reject

#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use summit_core::{
    entity::ConferenceField,
    filter::{self, FilterError, FIELDS, OPERATORS},
};
use summit_proto::ConferenceQueryForm;

#[derive(Debug, Arbitrary)]
enum FuzzName {
    Known(u8),
    Raw(String),
}

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Int(i64),
    Padded { value: i32, leading: u8, trailing: u8 },
    Text(String),
}

#[derive(Debug, Arbitrary)]
struct FuzzFilter {
    field: FuzzName,
    operator: FuzzName,
    value: FuzzValue,
}

impl FuzzFilter {
    fn to_form(&self) -> ConferenceQueryForm {
        let field = match &self.field {
            FuzzName::Known(i) => FIELDS[usize::from(*i) % FIELDS.len()].0.to_string(),
            FuzzName::Raw(raw) => raw.clone(),
        };
        let operator = match &self.operator {
            FuzzName::Known(i) => OPERATORS[usize::from(*i) % OPERATORS.len()].0.to_string(),
            FuzzName::Raw(raw) => raw.clone(),
        };
        let value = match &self.value {
            FuzzValue::Int(v) => v.to_string(),
            FuzzValue::Padded { value, leading, trailing } => format!(
                "{}{value}{}",
                " ".repeat(usize::from(*leading % 4)),
                " ".repeat(usize::from(*trailing % 4))
            ),
            FuzzValue::Text(text) => text.clone(),
        };
        ConferenceQueryForm::new(field, operator, value)
    }
}

fn inequality_fields(forms: &[ConferenceQueryForm]) -> BTreeSet<String> {
    forms
        .iter()
        .filter(|form| {
            OPERATORS
                .iter()
                .any(|(name, operator)| *name == form.operator && operator.is_inequality())
        })
        .filter(|form| FIELDS.iter().any(|(name, _)| *name == form.field))
        .map(|form| form.field.clone())
        .collect()
}

fuzz_target!(|filters: Vec<FuzzFilter>| {
    let forms: Vec<ConferenceQueryForm> = filters.iter().map(FuzzFilter::to_form).collect();

    match filter::compile(&forms) {
        Ok(query) => {
            let inequalities = inequality_fields(&forms);
            assert!(inequalities.len() <= 1, "accepted two inequality fields: {inequalities:?}");
            assert_eq!(query.predicates().len(), forms.len());

            let order = query.order();
            assert_eq!(order.last(), Some(&ConferenceField::Name));
            assert_eq!(order.len(), inequalities.len() + 1);
        },
        Err(FilterError::MultipleInequalityFields { first, second }) => {
            assert_ne!(first, second);
        },
        Err(FilterError::InvalidFilter { .. } | FilterError::InvalidValue { .. }) => {},
    }
});
