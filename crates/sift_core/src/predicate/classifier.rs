//! Query shape diagnostics.

use super::ast::{LogicalClause, LogicalPredicate, Occurrence, RangePredicate, TextPredicate};
use super::visitor::{walk_logical, PredicateVisitor};
use super::Predicate;
use crate::types::SortInfo;
use serde::Serialize;
use std::collections::BTreeSet;

/// Counts and field sets gathered from a predicate tree.
///
/// Used for logging and tooling only; nothing in query execution depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryInfo {
    /// `Must` clauses.
    pub must_count: usize,
    /// `Should` clauses.
    pub should_count: usize,
    /// `MustNot` clauses.
    pub must_not_count: usize,
    /// Text predicates with `*` or `?` other than a single trailing `*`.
    pub wildcard_count: usize,
    /// Text predicates with a fuzzy factor.
    pub fuzzy_count: usize,
    /// Plain term predicates.
    pub term_count: usize,
    /// Range predicates.
    pub range_count: usize,
    /// Text predicates ending in a single `*`.
    pub prefix_count: usize,
    /// Logical predicates.
    pub boolean_count: usize,
    /// Fields touched by predicates.
    pub query_fields: BTreeSet<String>,
    /// Fields used as sort keys.
    pub sort_fields: BTreeSet<String>,
}

impl QueryInfo {
    /// Classifies a predicate tree and its sort keys.
    #[must_use]
    pub fn classify(predicate: &Predicate, sort: &[SortInfo]) -> Self {
        let mut info = Self::default();
        info.visit_predicate(predicate);
        info.sort_fields = sort.iter().map(|s| s.field_name.clone()).collect();
        info
    }

    /// Total number of clauses.
    #[must_use]
    pub const fn clause_count(&self) -> usize {
        self.must_count + self.should_count + self.must_not_count
    }
}

fn is_prefix(text: &str) -> bool {
    text.len() > 1
        && text.ends_with('*')
        && !text[..text.len() - 1].contains(['*', '?'])
}

impl PredicateVisitor for QueryInfo {
    fn visit_text(&mut self, p: &TextPredicate) {
        self.query_fields.insert(p.field.clone());
        let text = p.value.as_text().unwrap_or_default();
        if p.fuzzy.is_some() {
            self.fuzzy_count += 1;
        } else if is_prefix(text) {
            self.prefix_count += 1;
        } else if text.contains(['*', '?']) {
            self.wildcard_count += 1;
        } else {
            self.term_count += 1;
        }
    }

    fn visit_range(&mut self, p: &RangePredicate) {
        self.query_fields.insert(p.field().to_string());
        self.range_count += 1;
    }

    fn visit_logical(&mut self, p: &LogicalPredicate) {
        self.boolean_count += 1;
        walk_logical(self, p);
    }

    fn visit_clause(&mut self, clause: &LogicalClause) {
        match clause.occurrence {
            Occurrence::Must => self.must_count += 1,
            Occurrence::Should => self.should_count += 1,
            Occurrence::MustNot => self.must_not_count += 1,
        }
        self.visit_predicate(&clause.predicate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_info::BuiltinFieldInfo;
    use crate::parser::parse;

    fn classify(text: &str) -> QueryInfo {
        let query = parse(text, &BuiltinFieldInfo::new()).unwrap();
        QueryInfo::classify(query.predicate(), &query.sort)
    }

    #[test]
    fn counts_clause_kinds() {
        let info = classify(
            "+Type:Folder -Name:tmp* Description:fo?bar Title:repot~0.7 Id:<5 .SORT:Name",
        );
        assert_eq!(info.must_count, 1);
        assert_eq!(info.must_not_count, 1);
        assert_eq!(info.should_count, 3);
        assert_eq!(info.term_count, 1);
        assert_eq!(info.prefix_count, 1);
        assert_eq!(info.wildcard_count, 1);
        assert_eq!(info.fuzzy_count, 1);
        assert_eq!(info.range_count, 1);
        assert_eq!(info.boolean_count, 1);
        assert_eq!(info.clause_count(), 5);
        assert_eq!(
            info.query_fields.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Description", "Id", "Name", "Title", "Type"]
        );
        assert!(info.sort_fields.contains("Name"));
    }

    #[test]
    fn nested_groups_count_as_boolean() {
        let info = classify("+(A:1 B:2) +(C:3 D:4)");
        assert_eq!(info.boolean_count, 3);
        assert_eq!(info.must_count, 2);
        assert_eq!(info.should_count, 4);
    }

    #[test]
    fn single_term_has_no_clauses() {
        let info = classify("Name:report");
        assert_eq!(info.clause_count(), 0);
        assert_eq!(info.term_count, 1);
        assert_eq!(info.boolean_count, 0);
    }
}
