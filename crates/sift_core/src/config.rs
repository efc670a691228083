//! Query configuration.

use crate::types::{ContentId, FilterStatus, QueryExecutionMode, SortInfo};

/// Process-wide query defaults.
///
/// `QueryConfig::default()` is the configuration every context starts from.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Whether system content is excluded when a query leaves autofilters at `Default`.
    pub autofilters_by_default: bool,

    /// Whether the lifespan window applies when a query leaves it at `Default`.
    pub lifespan_by_default: bool,

    /// Identity that may only run registered safe queries.
    pub system_user_id: ContentId,

    /// Field projected by a nested `{{ }}` fragment without `.SELECT`.
    pub inner_projection_field: String,

    /// Upper bound on nested fragment substitutions per query.
    pub max_nested_fragments: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            autofilters_by_default: true,
            lifespan_by_default: false,
            system_user_id: -1,
            inner_projection_field: "Id".to_string(),
            max_nested_fragments: 1000,
        }
    }
}

impl QueryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the autofilter default.
    #[must_use]
    pub const fn autofilters_by_default(mut self, value: bool) -> Self {
        self.autofilters_by_default = value;
        self
    }

    /// Sets the lifespan filter default.
    #[must_use]
    pub const fn lifespan_by_default(mut self, value: bool) -> Self {
        self.lifespan_by_default = value;
        self
    }

    /// Sets the system identity.
    #[must_use]
    pub const fn system_user_id(mut self, id: ContentId) -> Self {
        self.system_user_id = id;
        self
    }

    /// Sets the default projection of nested fragments.
    #[must_use]
    pub fn inner_projection_field(mut self, field: impl Into<String>) -> Self {
        self.inner_projection_field = field.into();
        self
    }

    /// Sets the nested fragment limit.
    #[must_use]
    pub const fn max_nested_fragments(mut self, value: usize) -> Self {
        self.max_nested_fragments = value;
        self
    }
}

/// Per-call settings of a text query.
///
/// Settings keywords written in the query text win; these values only fill
/// what the text leaves at its default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySettings {
    /// Maximum number of hits (0 = unbounded).
    pub top: usize,
    /// Number of hits to skip.
    pub skip: usize,
    /// Sort keys.
    pub sort: Vec<SortInfo>,
    /// Autofilter switch.
    pub enable_autofilters: FilterStatus,
    /// Lifespan filter switch.
    pub enable_lifespan_filter: FilterStatus,
    /// Execution-mode hint.
    pub execution_mode: QueryExecutionMode,
    /// Include every version, not just the last ones.
    pub all_versions: bool,
    /// Only the total count is needed.
    pub count_only: bool,
}

impl QuerySettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `top`.
    #[must_use]
    pub fn top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Sets `skip`.
    #[must_use]
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Appends a sort key.
    #[must_use]
    pub fn sort_by(mut self, sort: SortInfo) -> Self {
        self.sort.push(sort);
        self
    }

    /// Sets the autofilter switch.
    #[must_use]
    pub fn autofilters(mut self, status: FilterStatus) -> Self {
        self.enable_autofilters = status;
        self
    }

    /// Sets the lifespan switch.
    #[must_use]
    pub fn lifespan(mut self, status: FilterStatus) -> Self {
        self.enable_lifespan_filter = status;
        self
    }

    /// Sets the execution-mode hint.
    #[must_use]
    pub fn execution_mode(mut self, mode: QueryExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    /// Requests only the total count.
    #[must_use]
    pub fn count_only(mut self, value: bool) -> Self {
        self.count_only = value;
        self
    }
}
