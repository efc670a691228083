//! Terms and indexed fields.

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use sift_codec::IndexValue;

/// How a field's text is turned into index terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum IndexingMode {
    /// Engine default.
    #[default]
    Default = 0,
    /// Run through the analyzer.
    Analyzed = 1,
    /// Analyzed without length norms.
    AnalyzedNoNorms = 2,
    /// Not searchable.
    No = 3,
    /// Indexed as a single term.
    NotAnalyzed = 4,
    /// Single term without length norms.
    NotAnalyzedNoNorms = 5,
}

/// Whether the raw value is stored alongside the terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum StoringMode {
    /// Engine default.
    #[default]
    Default = 0,
    /// Do not store.
    No = 1,
    /// Store the value.
    Yes = 2,
}

/// Term vector retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TermVector {
    /// Engine default.
    #[default]
    Default = 0,
    /// No term vectors.
    No = 1,
    /// Term vectors with offsets.
    WithOffsets = 2,
    /// Term vectors with positions.
    WithPositions = 3,
    /// Term vectors with positions and offsets.
    WithPositionsOffsets = 4,
    /// Plain term vectors.
    Yes = 5,
}

macro_rules! impl_try_from_u8 {
    ($ty:ident { $($n:literal => $variant:ident),+ $(,)? }) => {
        impl TryFrom<u8> for $ty {
            type Error = QueryError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($n => Ok(Self::$variant),)+
                    other => Err(QueryError::invalid_operation(format!(
                        "unknown {} tag: {other}",
                        stringify!($ty)
                    ))),
                }
            }
        }
    };
}

impl_try_from_u8!(IndexingMode {
    0 => Default,
    1 => Analyzed,
    2 => AnalyzedNoNorms,
    3 => No,
    4 => NotAnalyzed,
    5 => NotAnalyzedNoNorms,
});

impl_try_from_u8!(StoringMode {
    0 => Default,
    1 => No,
    2 => Yes,
});

impl_try_from_u8!(TermVector {
    0 => Default,
    1 => No,
    2 => WithOffsets,
    3 => WithPositions,
    4 => WithPositionsOffsets,
    5 => Yes,
});

/// A field name with a typed value.
///
/// Used both to write a field and to address documents by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: IndexValue,
}

impl Term {
    /// Creates a term.
    pub fn new(name: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A term plus its indexing directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    term: Term,
    indexing: IndexingMode,
    storing: StoringMode,
    term_vector: TermVector,
}

impl IndexField {
    /// Creates a field with default directives.
    pub fn new(name: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self::from_term(Term::new(name, value))
    }

    /// Creates a field from a term with default directives.
    #[must_use]
    pub fn from_term(term: Term) -> Self {
        Self {
            term,
            indexing: IndexingMode::Default,
            storing: StoringMode::Default,
            term_vector: TermVector::Default,
        }
    }

    /// Sets the indexing mode.
    #[must_use]
    pub const fn with_indexing(mut self, mode: IndexingMode) -> Self {
        self.indexing = mode;
        self
    }

    /// Sets the storing mode.
    #[must_use]
    pub const fn with_storing(mut self, mode: StoringMode) -> Self {
        self.storing = mode;
        self
    }

    /// Sets the term vector mode.
    #[must_use]
    pub const fn with_term_vector(mut self, mode: TermVector) -> Self {
        self.term_vector = mode;
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.term.name
    }

    /// Field value.
    #[must_use]
    pub const fn value(&self) -> &IndexValue {
        &self.term.value
    }

    /// The underlying term.
    #[must_use]
    pub const fn term(&self) -> &Term {
        &self.term
    }

    /// Indexing mode.
    #[must_use]
    pub const fn indexing(&self) -> IndexingMode {
        self.indexing
    }

    /// Storing mode.
    #[must_use]
    pub const fn storing(&self) -> StoringMode {
        self.storing
    }

    /// Term vector mode.
    #[must_use]
    pub const fn term_vector(&self) -> TermVector {
        self.term_vector
    }
}

/// Decodes the three directive tags of an encoded field.
pub(crate) fn directives_from_tags(
    indexing: u64,
    storing: u64,
    term_vector: u64,
) -> QueryResult<(IndexingMode, StoringMode, TermVector)> {
    let narrow = |tag: u64| {
        u8::try_from(tag).map_err(|_| {
            QueryError::invalid_operation(format!("directive tag out of range: {tag}"))
        })
    };
    Ok((
        IndexingMode::try_from(narrow(indexing)?)?,
        StoringMode::try_from(narrow(storing)?)?,
        TermVector::try_from(narrow(term_vector)?)?,
    ))
}
