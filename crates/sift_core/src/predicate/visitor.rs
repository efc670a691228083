//! Traversal of predicate trees.
//!
//! [`PredicateVisitor`] walks a borrowed tree for analysis and rendering.
//! [`PredicateRewriter`] folds an owned tree into a new one. Both recurse into
//! children by default, so an implementation only overrides the node kinds
//! it cares about.

use super::ast::{LogicalClause, LogicalPredicate, Predicate, RangePredicate, TextPredicate};
use crate::document::names;
use sift_codec::IndexValue;

/// Read-only traversal.
pub trait PredicateVisitor {
    /// Dispatches on the node kind.
    fn visit_predicate(&mut self, predicate: &Predicate) {
        walk_predicate(self, predicate);
    }

    /// Visits a text predicate.
    fn visit_text(&mut self, _predicate: &TextPredicate) {}

    /// Visits a range predicate.
    fn visit_range(&mut self, _predicate: &RangePredicate) {}

    /// Visits a logical predicate and, by default, its clauses in order.
    fn visit_logical(&mut self, predicate: &LogicalPredicate) {
        walk_logical(self, predicate);
    }

    /// Visits a clause and, by default, its predicate.
    fn visit_clause(&mut self, clause: &LogicalClause) {
        self.visit_predicate(&clause.predicate);
    }
}

/// Default dispatch of [`PredicateVisitor::visit_predicate`].
pub fn walk_predicate<V: PredicateVisitor + ?Sized>(visitor: &mut V, predicate: &Predicate) {
    match predicate {
        Predicate::Text(p) => visitor.visit_text(p),
        Predicate::Range(p) => visitor.visit_range(p),
        Predicate::Logical(p) => visitor.visit_logical(p),
    }
}

/// Default recursion of [`PredicateVisitor::visit_logical`].
pub fn walk_logical<V: PredicateVisitor + ?Sized>(visitor: &mut V, predicate: &LogicalPredicate) {
    for clause in predicate.clauses() {
        visitor.visit_clause(clause);
    }
}

/// Owned fold producing a rewritten tree.
pub trait PredicateRewriter {
    /// Dispatches on the node kind.
    fn rewrite(&mut self, predicate: Predicate) -> Predicate {
        fold_predicate(self, predicate)
    }

    /// Rewrites a text predicate. Identity by default.
    fn rewrite_text(&mut self, predicate: TextPredicate) -> Predicate {
        Predicate::Text(predicate)
    }

    /// Rewrites a range predicate. Identity by default.
    fn rewrite_range(&mut self, predicate: RangePredicate) -> Predicate {
        Predicate::Range(predicate)
    }

    /// Rewrites a logical predicate, by default clause by clause in order.
    fn rewrite_logical(&mut self, predicate: LogicalPredicate) -> Predicate {
        fold_logical(self, predicate)
    }

    /// Rewrites a clause, keeping its occurrence.
    fn rewrite_clause(&mut self, clause: LogicalClause) -> LogicalClause {
        LogicalClause::new(self.rewrite(clause.predicate), clause.occurrence)
    }
}

/// Default dispatch of [`PredicateRewriter::rewrite`].
pub fn fold_predicate<R: PredicateRewriter + ?Sized>(
    rewriter: &mut R,
    predicate: Predicate,
) -> Predicate {
    match predicate {
        Predicate::Text(p) => rewriter.rewrite_text(p),
        Predicate::Range(p) => rewriter.rewrite_range(p),
        Predicate::Logical(p) => rewriter.rewrite_logical(p),
    }
}

/// Default recursion of [`PredicateRewriter::rewrite_logical`].
pub fn fold_logical<R: PredicateRewriter + ?Sized>(
    rewriter: &mut R,
    predicate: LogicalPredicate,
) -> Predicate {
    let clauses = predicate
        .into_clauses()
        .into_iter()
        .map(|clause| rewriter.rewrite_clause(clause))
        .collect();
    Predicate::Logical(LogicalPredicate::new(clauses))
}

/// Lowercases text terms of the path-like structural fields.
///
/// Names and paths are indexed lowercased, so query terms must be too.
#[derive(Debug, Default)]
pub struct StructuralValueNormalizer;

impl StructuralValueNormalizer {
    const FIELDS: [&'static str; 4] = [names::NAME, names::PATH, names::IN_TREE, names::IN_FOLDER];

    fn applies_to(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }

    fn lowercase(value: IndexValue) -> IndexValue {
        match value.as_text() {
            Some(text) if text.chars().any(char::is_uppercase) => {
                IndexValue::from(text.to_lowercase())
            }
            _ => value,
        }
    }
}

impl PredicateRewriter for StructuralValueNormalizer {
    fn rewrite_text(&mut self, mut predicate: TextPredicate) -> Predicate {
        if Self::applies_to(&predicate.field) && !predicate.is_empty_inner_query() {
            predicate.value = Self::lowercase(predicate.value);
        }
        Predicate::Text(predicate)
    }

    fn rewrite_range(&mut self, predicate: RangePredicate) -> Predicate {
        if !Self::applies_to(predicate.field()) || predicate.is_match_all() {
            return Predicate::Range(predicate);
        }
        let boost = predicate.boost();
        let rebuilt = RangePredicate::new(
            predicate.field(),
            predicate.min().cloned().map(Self::lowercase),
            predicate.max().cloned().map(Self::lowercase),
            predicate.min_exclusive(),
            predicate.max_exclusive(),
        );
        match (rebuilt, boost) {
            (Ok(range), Some(boost)) => Predicate::Range(range.with_boost(boost)),
            (Ok(range), None) => Predicate::Range(range),
            // Cannot happen: the original range had a bound.
            (Err(_), _) => Predicate::Range(predicate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::ast::Occurrence;

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<String>,
    }

    impl PredicateVisitor for FieldCollector {
        fn visit_text(&mut self, p: &TextPredicate) {
            self.fields.push(p.field.clone());
        }

        fn visit_range(&mut self, p: &RangePredicate) {
            self.fields.push(p.field().to_string());
        }
    }

    struct RenameField;

    impl PredicateRewriter for RenameField {
        fn rewrite_text(&mut self, mut p: TextPredicate) -> Predicate {
            if p.field == "Old" {
                p.field = "New".into();
            }
            Predicate::Text(p)
        }
    }

    fn sample() -> Predicate {
        Predicate::Logical(LogicalPredicate::new(vec![
            LogicalClause::new(Predicate::text("Old", "a"), Occurrence::Must),
            LogicalClause::new(
                Predicate::pair(
                    Predicate::text("B", "b"),
                    RangePredicate::at_least("C", 1, false).into(),
                    Occurrence::Should,
                ),
                Occurrence::MustNot,
            ),
            LogicalClause::new(Predicate::text("Old", "d"), Occurrence::Should),
        ]))
    }

    #[test]
    fn visitor_walks_in_clause_order() {
        let mut collector = FieldCollector::default();
        collector.visit_predicate(&sample());
        assert_eq!(collector.fields, vec!["Old", "B", "C", "Old"]);
    }

    #[test]
    fn rewriter_preserves_shape() {
        let rewritten = RenameField.rewrite(sample());
        let mut collector = FieldCollector::default();
        collector.visit_predicate(&rewritten);
        assert_eq!(collector.fields, vec!["New", "B", "C", "New"]);

        let Predicate::Logical(logical) = rewritten else {
            panic!("expected logical predicate");
        };
        let occurrences: Vec<_> = logical.clauses().iter().map(|c| c.occurrence).collect();
        assert_eq!(
            occurrences,
            vec![Occurrence::Must, Occurrence::MustNot, Occurrence::Should]
        );
    }

    #[test]
    fn normalizer_lowercases_paths_only() {
        let tree = Predicate::pair(
            Predicate::text("InTree", "/Root/Sites"),
            Predicate::text("DisplayName", "Sites"),
            Occurrence::Must,
        );
        let Predicate::Logical(logical) = StructuralValueNormalizer.rewrite(tree) else {
            panic!("expected logical predicate");
        };
        let values: Vec<_> = logical
            .clauses()
            .iter()
            .filter_map(|c| match &c.predicate {
                Predicate::Text(t) => t.value.as_text().map(str::to_string),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec!["/root/sites", "Sites"]);
    }
}
