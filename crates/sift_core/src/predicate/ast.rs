//! Predicate tree nodes.

use crate::error::{QueryError, QueryResult};
use serde::Serialize;
use sift_codec::IndexValue;

/// Value substituted for a nested query without hits.
///
/// Accepted for any field type and never matches a document.
pub const EMPTY_INNER_QUERY: &str = "$##$EMPTYINNERQUERY$##$";

/// Default fuzzy factor of a bare `~` suffix.
pub const DEFAULT_FUZZY: f64 = 0.5;

/// A node of the boolean query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Term, phrase, wildcard or fuzzy match on one field.
    Text(TextPredicate),
    /// Interval match on one field.
    Range(RangePredicate),
    /// Boolean combination of clauses.
    Logical(LogicalPredicate),
}

impl Predicate {
    /// Creates a plain term predicate.
    pub fn text(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self::Text(TextPredicate::new(field, value))
    }

    /// Combines two predicates under the same occurrence.
    #[must_use]
    pub fn pair(first: Self, second: Self, occurrence: Occurrence) -> Self {
        Self::Logical(LogicalPredicate::new(vec![
            LogicalClause::new(first, occurrence),
            LogicalClause::new(second, occurrence),
        ]))
    }
}

impl From<TextPredicate> for Predicate {
    fn from(p: TextPredicate) -> Self {
        Self::Text(p)
    }
}

impl From<RangePredicate> for Predicate {
    fn from(p: RangePredicate) -> Self {
        Self::Range(p)
    }
}

impl From<LogicalPredicate> for Predicate {
    fn from(p: LogicalPredicate) -> Self {
        Self::Logical(p)
    }
}

/// Matches one field against a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPredicate {
    /// Field name.
    pub field: String,
    /// Value to match. Text values may carry `*` and `?` wildcards.
    pub value: IndexValue,
    /// Fuzzy similarity factor.
    pub fuzzy: Option<f64>,
    /// Score boost.
    pub boost: Option<f64>,
}

impl TextPredicate {
    /// Creates a term predicate without fuzziness or boost.
    pub fn new(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            fuzzy: None,
            boost: None,
        }
    }

    /// Sets the fuzzy factor.
    #[must_use]
    pub const fn with_fuzzy(mut self, fuzzy: f64) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    /// Sets the boost.
    #[must_use]
    pub const fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Returns true for the empty nested query sentinel.
    #[must_use]
    pub fn is_empty_inner_query(&self) -> bool {
        self.value.as_text() == Some(EMPTY_INNER_QUERY)
    }
}

/// Matches one field against an interval.
///
/// At least one bound is present, except for the match-all sentinel built
/// by [`RangePredicate::match_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct RangePredicate {
    field: String,
    min: Option<IndexValue>,
    max: Option<IndexValue>,
    min_exclusive: bool,
    max_exclusive: bool,
    boost: Option<f64>,
}

impl RangePredicate {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidRange`] if both bounds are missing.
    pub fn new(
        field: impl Into<String>,
        min: Option<IndexValue>,
        max: Option<IndexValue>,
        min_exclusive: bool,
        max_exclusive: bool,
    ) -> QueryResult<Self> {
        let field = field.into();
        if min.is_none() && max.is_none() {
            return Err(QueryError::InvalidRange { field });
        }
        Ok(Self {
            field,
            min,
            max,
            min_exclusive,
            max_exclusive,
            boost: None,
        })
    }

    /// `[value TO *]`, or `{value TO *}` when exclusive.
    pub fn at_least(field: impl Into<String>, min: impl Into<IndexValue>, exclusive: bool) -> Self {
        Self {
            field: field.into(),
            min: Some(min.into()),
            max: None,
            min_exclusive: exclusive,
            max_exclusive: false,
            boost: None,
        }
    }

    /// `[* TO value]`, or `{* TO value}` when exclusive.
    pub fn at_most(field: impl Into<String>, max: impl Into<IndexValue>, exclusive: bool) -> Self {
        Self {
            field: field.into(),
            min: None,
            max: Some(max.into()),
            min_exclusive: false,
            max_exclusive: exclusive,
            boost: None,
        }
    }

    /// `[* TO *]`: every document that has the field.
    pub fn match_all(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            min: None,
            max: None,
            min_exclusive: false,
            max_exclusive: false,
            boost: None,
        }
    }

    /// Sets the boost.
    #[must_use]
    pub const fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> Option<&IndexValue> {
        self.min.as_ref()
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> Option<&IndexValue> {
        self.max.as_ref()
    }

    /// True if the lower bound is excluded.
    #[must_use]
    pub const fn min_exclusive(&self) -> bool {
        self.min_exclusive
    }

    /// True if the upper bound is excluded.
    #[must_use]
    pub const fn max_exclusive(&self) -> bool {
        self.max_exclusive
    }

    /// Score boost.
    #[must_use]
    pub const fn boost(&self) -> Option<f64> {
        self.boost
    }

    /// Returns true for the `[* TO *]` sentinel.
    #[must_use]
    pub const fn is_match_all(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Returns true if a value lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: &IndexValue) -> bool {
        let above = match &self.min {
            None => true,
            Some(min) if self.min_exclusive => value > min,
            Some(min) => value >= min,
        };
        let below = match &self.max {
            None => true,
            Some(max) if self.max_exclusive => value < max,
            Some(max) => value <= max,
        };
        above && below
    }
}

/// Boolean role of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Occurrence {
    /// Required (`+`, AND).
    Must,
    /// Optional (no prefix, OR).
    Should,
    /// Prohibited (`-`, NOT).
    MustNot,
}

impl Occurrence {
    /// Clause prefix in query text.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Must => "+",
            Self::Should => "",
            Self::MustNot => "-",
        }
    }
}

/// A predicate with its boolean role.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalClause {
    /// The wrapped predicate.
    pub predicate: Predicate,
    /// Its role in the enclosing logical predicate.
    pub occurrence: Occurrence,
}

impl LogicalClause {
    /// Creates a clause.
    #[must_use]
    pub const fn new(predicate: Predicate, occurrence: Occurrence) -> Self {
        Self {
            predicate,
            occurrence,
        }
    }
}

/// Ordered list of clauses. Order is significant and preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicalPredicate {
    clauses: Vec<LogicalClause>,
}

impl LogicalPredicate {
    /// Creates a logical predicate.
    #[must_use]
    pub const fn new(clauses: Vec<LogicalClause>) -> Self {
        Self { clauses }
    }

    /// Appends a clause.
    pub fn push(&mut self, predicate: Predicate, occurrence: Occurrence) {
        self.clauses.push(LogicalClause::new(predicate, occurrence));
    }

    /// The clauses in order.
    #[must_use]
    pub fn clauses(&self) -> &[LogicalClause] {
        &self.clauses
    }

    /// Consumes the predicate, returning its clauses.
    #[must_use]
    pub fn into_clauses(self) -> Vec<LogicalClause> {
        self.clauses
    }
}
