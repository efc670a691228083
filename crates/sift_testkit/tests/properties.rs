//! Property tests over generated values, trees and texts.

use proptest::prelude::*;
use sift_core::legacy::{
    add_clause, move_settings_to_the_end, substitute_parameters, LogicalOperator,
};
use sift_core::predicate::to_text;
use sift_core::{
    BuiltinFieldInfo, ContentQuery, IndexDocument, IndexValue, Query, QueryConfig, QueryError,
};
use sift_testkit::prelude::*;
use std::cmp::Ordering;

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn canonical_text_parses_to_the_same_tree(predicate in predicate_strategy()) {
        let text = to_text(&predicate);
        let parsed = Query::parse(&text, &BuiltinFieldInfo::new()).unwrap();
        prop_assert_eq!(parsed.predicate(), &predicate, "text: {}", text);
    }

    #[test]
    fn query_text_survives_a_second_round(predicate in predicate_strategy(), top in 0usize..50) {
        let mut query = Query::new(predicate);
        query.top = top;
        let once = Query::parse(&query.to_text(), &BuiltinFieldInfo::new()).unwrap();
        let twice = Query::parse(&once.to_text(), &BuiltinFieldInfo::new()).unwrap();
        prop_assert_eq!(once.predicate(), twice.predicate());
        prop_assert_eq!(once.top, top);
        prop_assert_eq!(twice.top, top);
    }

    #[test]
    fn same_tag_values_order_naturally(a in any::<i32>(), b in any::<i32>()) {
        prop_assert_eq!(IndexValue::from(a).cmp(&IndexValue::from(b)), a.cmp(&b));
    }

    #[test]
    fn same_tag_texts_order_naturally(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
        prop_assert_eq!(
            IndexValue::from(a.as_str()).cmp(&IndexValue::from(b.as_str())),
            a.cmp(&b)
        );
    }

    #[test]
    fn cross_tag_values_order_by_tag(a in index_value_strategy(), b in index_value_strategy()) {
        if a.value_type() != b.value_type() {
            prop_assert_eq!(a.cmp(&b), a.value_type().cmp(&b.value_type()));
        } else {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }
    }

    #[test]
    fn last_write_wins(first in index_value_strategy(), second in index_value_strategy()) {
        let mut document = IndexDocument::new();
        document.add_value("Description", first);
        document.add_value("Description", second.clone());
        prop_assert_eq!(document.len(), 1);
        prop_assert_eq!(document.get("Description").map(|f| f.value()), Some(&second));
    }

    #[test]
    fn forbidden_fields_never_appear(value in index_value_strategy(), pick in 0usize..3) {
        let forbidden = ["Password", "PasswordHash", "PasswordSalt"][pick];
        let mut document = IndexDocument::new();
        prop_assert!(!document.add_value(forbidden, value));
        prop_assert!(document.field_names().all(|name| name != forbidden));
        prop_assert!(document.is_empty());
    }

    #[test]
    fn prepare_is_idempotent(
        predicate in predicate_strategy(),
        autofilters in any::<bool>(),
        lifespan in any::<bool>(),
    ) {
        let config = QueryConfig::default()
            .autofilters_by_default(autofilters)
            .lifespan_by_default(lifespan);
        let mut once = Query::new(predicate);
        once.prepare(&config).unwrap();
        let mut twice = once.clone();
        twice.prepare(&config).unwrap();
        prop_assert_eq!(once.predicate(), twice.predicate());
    }

    #[test]
    fn substitution_replaces_every_placeholder(
        params in prop::collection::vec(query_param_strategy(), 1..5),
        picks in prop::collection::vec(0usize..5, 0..6),
    ) {
        let template: Vec<String> = picks
            .iter()
            .map(|pick| format!("Field{pick}:@{}", pick % params.len()))
            .collect();
        let expected: Vec<String> = picks
            .iter()
            .map(|pick| format!("Field{pick}:{}", params[pick % params.len()].escape()))
            .collect();
        let text = substitute_parameters(&template.join(" "), &params).unwrap();
        prop_assert_eq!(text, expected.join(" "));
    }

    #[test]
    fn placeholder_past_the_parameters_is_rejected(count in 0usize..4, extra in 0usize..4) {
        let params: Vec<sift_core::QueryParam> = (0..count).map(|n| (n as i64).into()).collect();
        let index = count + extra;
        let err = substitute_parameters(&format!("Id:@{index}"), &params).unwrap_err();
        prop_assert_eq!(err, QueryError::ParameterCountMismatch { index, count });
    }

    #[test]
    fn unregistered_text_is_refused_only_for_the_system_user(name in "[a-z]{1,8}") {
        let (engine, context) = sample_context();
        let query = ContentQuery::new(format!("+Name:{name} .TOP:7"));

        let system = context.clone().with_user(-1);
        let refused = query.execute(&system).unwrap_err();
        prop_assert!(matches!(refused, QueryError::SecurityViolation { .. }), "expected SecurityViolation");
        prop_assert_eq!(engine.calls(), 0);

        prop_assert!(query.execute(&context).is_ok());
        prop_assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn merged_clauses_nest_both_sides(
        a in "[A-Z][a-z]{0,4}:[0-9]{1,3}",
        b in "[A-Z][a-z]{0,4}:[0-9]{1,3}",
    ) {
        prop_assert_eq!(
            add_clause(&a, &b, LogicalOperator::And).unwrap(),
            format!("+({a}) +({b})")
        );
        prop_assert_eq!(
            add_clause(&a, &b, LogicalOperator::Or).unwrap(),
            format!("({a}) ({b})")
        );
    }
}

#[test]
fn cross_tag_ordering_ignores_values() {
    let text = IndexValue::from("zzz");
    let flag = IndexValue::from(false);
    let number = IndexValue::from(i32::MIN);
    assert_eq!(text.cmp(&flag), Ordering::Less);
    assert_eq!(flag.cmp(&number), Ordering::Less);
    assert_eq!(number.cmp(&IndexValue::from(i64::MIN)), Ordering::Less);
}

#[test]
fn documented_examples() {
    assert_eq!(
        move_settings_to_the_end("Name:'SKIP' .TOP:5 Name:foo"),
        "Name:'SKIP' Name:foo .TOP:5"
    );
    assert_eq!(
        substitute_parameters("+TypeIs:@0 +Name:@1", &["Folder".into(), "My Doc".into()]).unwrap(),
        "+TypeIs:Folder +Name:\"My Doc\""
    );
    assert_eq!(add_clause("A:1", "B:2", LogicalOperator::And).unwrap(), "+(A:1) +(B:2)");
    assert_eq!(add_clause("A:1", "B:2", LogicalOperator::Or).unwrap(), "(A:1) (B:2)");
}
