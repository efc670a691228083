//! Core type definitions shared by queries and engines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a content item, as stored in the `Id` index field.
pub type ContentId = i32;

/// Tri-state switch for the implicit query filters.
///
/// `Default` defers to the process-wide default in [`crate::QueryConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterStatus {
    /// Use the configured default.
    #[default]
    Default,
    /// Force the filter on.
    Enabled,
    /// Force the filter off.
    Disabled,
}

impl FilterStatus {
    /// Resolves the status against a default.
    #[must_use]
    pub const fn is_enabled(self, default: bool) -> bool {
        match self {
            Self::Default => default,
            Self::Enabled => true,
            Self::Disabled => false,
        }
    }

    /// Returns the keyword argument used in query text, if not `Default`.
    #[must_use]
    pub const fn keyword_value(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Enabled => Some("ON"),
            Self::Disabled => Some("OFF"),
        }
    }
}

/// Hint for the engines on how strictly a query must be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueryExecutionMode {
    /// Engine decides.
    #[default]
    Default,
    /// Results must reflect every committed change.
    Strict,
    /// Slightly stale results are acceptable.
    Quick,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortInfo {
    /// Field to sort on.
    pub field_name: String,
    /// Descending order when true.
    pub reverse: bool,
}

impl SortInfo {
    /// Ascending sort on a field.
    pub fn ascending(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            reverse: false,
        }
    }

    /// Descending sort on a field.
    pub fn descending(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            reverse: true,
        }
    }
}

impl fmt::Display for SortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reverse {
            write!(f, ".REVERSESORT:{}", self.field_name)
        } else {
            write!(f, ".SORT:{}", self.field_name)
        }
    }
}
