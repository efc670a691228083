//! Predicate model.
//!
//! A closed set of node kinds ([`Predicate`]) with two traversal styles:
//! a borrowing [`PredicateVisitor`] and an owning [`PredicateRewriter`].
//! The classifier and the text writer are visitors.

mod ast;
mod classifier;
mod visitor;
mod writer;

pub use ast::{
    LogicalClause, LogicalPredicate, Occurrence, Predicate, RangePredicate, TextPredicate,
    DEFAULT_FUZZY, EMPTY_INNER_QUERY,
};
pub use classifier::QueryInfo;
pub use visitor::{
    fold_logical, fold_predicate, walk_logical, walk_predicate, PredicateRewriter,
    PredicateVisitor, StructuralValueNormalizer,
};
pub use writer::{needs_quotes, quote, to_text, SPECIAL_CHARS};
