//! Property-based test generators using proptest.
//!
//! Predicate strategies produce trees in the shape the parser itself
//! builds, so `parse(to_text(tree)) == tree` holds exactly:
//!
//! - text values are typed the way [`sift_core::BuiltinFieldInfo`] types them
//! - structural fields whose values get lowercased are left out
//! - a logical node never holds a single optional clause

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use sift_core::predicate::{
    LogicalClause, LogicalPredicate, Occurrence, Predicate, RangePredicate, TextPredicate,
};
use sift_core::{IndexValue, QueryParam};

/// Text fields the builtin field info leaves untyped.
pub const TEXT_FIELDS: &[&str] = &["_Text", "Type", "Description", "Title", "Keywords"];

/// Integer fields of the builtin field info.
pub const INT_FIELDS: &[&str] = &["Id", "ParentId", "Depth", "OwnerId"];

/// Date-time fields of the builtin field info.
pub const DATE_FIELDS: &[&str] = &["CreationDate", "ModificationDate", "ValidFrom", "ValidTill"];

/// Strategy for date-times between 1970 and 2100, sub-second part included.
pub fn date_time_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800, 0u32..1_000_000_000)
        .prop_filter_map("valid timestamp", |(secs, n)| Utc.timestamp_opt(secs, n).single())
}

/// Strategy for typed values of every type.
pub fn index_value_strategy() -> impl Strategy<Value = IndexValue> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,12}".prop_map(IndexValue::from),
        prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(IndexValue::from),
        any::<bool>().prop_map(IndexValue::from),
        any::<i32>().prop_map(IndexValue::from),
        prop::collection::vec(any::<i32>(), 0..4).prop_map(IndexValue::from),
        any::<i64>().prop_map(IndexValue::from),
        any::<f32>()
            .prop_filter("finite", |n| n.is_finite())
            .prop_map(IndexValue::from),
        any::<f64>()
            .prop_filter("finite", |n| n.is_finite())
            .prop_map(IndexValue::from),
        date_time_strategy().prop_map(IndexValue::from),
    ]
}

fn text_field() -> impl Strategy<Value = &'static str> {
    prop::sample::select(TEXT_FIELDS)
}

fn int_field() -> impl Strategy<Value = &'static str> {
    prop::sample::select(INT_FIELDS)
}

/// Words and phrases, some of which need quoting.
fn text_value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9]{0,6}",
        1 => "[a-z]{1,4} [a-z]{1,4}",
        1 => "[a-z]{1,4}\\.[a-z]{1,3}",
    ]
}

fn boost() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(prop::sample::select(vec![0.5, 2.0, 3.0]))
}

fn fuzzy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        4 => Just(None),
        1 => prop::sample::select(vec![0.5, 0.8]).prop_map(Some),
    ]
}

/// Strategy for text predicates.
pub fn text_predicate_strategy() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        (text_field(), text_value(), fuzzy(), boost()).prop_map(|(field, value, fuzzy, boost)| {
            let mut predicate = TextPredicate::new(field, value);
            predicate.fuzzy = fuzzy;
            predicate.boost = boost;
            Predicate::Text(predicate)
        }),
        (int_field(), any::<i32>(), boost()).prop_map(|(field, value, boost)| {
            let mut predicate = TextPredicate::new(field, value);
            predicate.boost = boost;
            Predicate::Text(predicate)
        }),
        (prop::sample::select(DATE_FIELDS), date_time_strategy())
            .prop_map(|(field, value)| Predicate::text(field, value)),
    ]
}

/// Strategy for range predicates on integer fields.
pub fn range_predicate_strategy() -> impl Strategy<Value = Predicate> {
    (
        int_field(),
        prop::option::of(any::<i32>()),
        prop::option::of(any::<i32>()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(field, min, max, min_exclusive, max_exclusive)| {
            let range = match (min, max) {
                (None, None) => RangePredicate::match_all(field),
                (Some(min), None) => RangePredicate::at_least(field, min, min_exclusive),
                (None, Some(max)) => RangePredicate::at_most(field, max, max_exclusive),
                (Some(min), Some(max)) => RangePredicate::new(
                    field,
                    Some(IndexValue::from(min)),
                    Some(IndexValue::from(max)),
                    min_exclusive,
                    max_exclusive,
                )
                .unwrap_or_else(|_| RangePredicate::match_all(field)),
            };
            Predicate::Range(range)
        })
}

fn occurrence() -> impl Strategy<Value = Occurrence> {
    prop_oneof![
        Just(Occurrence::Must),
        Just(Occurrence::Should),
        Just(Occurrence::MustNot),
    ]
}

/// Strategy for predicate trees up to a few levels deep.
pub fn predicate_strategy() -> impl Strategy<Value = Predicate> {
    let leaf = prop_oneof![
        3 => text_predicate_strategy(),
        1 => range_predicate_strategy(),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec((inner.clone(), occurrence()), 2..5),
            (inner, prop_oneof![Just(Occurrence::Must), Just(Occurrence::MustNot)])
                .prop_map(|clause| vec![clause]),
        ]
        .prop_map(|clauses| {
            Predicate::Logical(LogicalPredicate::new(
                clauses
                    .into_iter()
                    .map(|(predicate, occurrence)| LogicalClause::new(predicate, occurrence))
                    .collect(),
            ))
        })
    })
}

/// Strategy for template parameters.
pub fn query_param_strategy() -> impl Strategy<Value = QueryParam> {
    let scalar = prop_oneof![
        ".{0,12}".prop_map(QueryParam::Text),
        any::<i64>().prop_map(QueryParam::Integer),
        any::<bool>().prop_map(QueryParam::Bool),
    ];
    prop_oneof![
        3 => scalar.clone(),
        1 => prop::collection::vec(scalar, 0..4).prop_map(QueryParam::List),
    ]
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::predicate::to_text;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_trees_render(predicate in predicate_strategy()) {
            prop_assert!(!to_text(&predicate).is_empty());
        }

        #[test]
        fn no_single_optional_clause(predicate in predicate_strategy()) {
            if let Predicate::Logical(logical) = &predicate {
                prop_assert!(
                    logical.clauses().len() > 1
                        || logical.clauses()[0].occurrence != Occurrence::Should
                );
            }
        }
    }
}
