//! Safe query registry.
//!
//! The system identity may only run query templates that a module has
//! registered as vetted. Modules contribute through [`SafeQuerySet`], the
//! host assembles them with [`SafeQueriesBuilder`] and installs the result
//! once at startup. After that the set is read-only.

use crate::error::{QueryError, QueryResult};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;

static INSTALLED: OnceCell<Arc<SafeQueries>> = OnceCell::new();

/// A module's vetted query templates.
pub trait SafeQuerySet {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// The exact template texts, before parameter substitution.
    fn queries(&self) -> Vec<&'static str>;
}

/// Immutable set of safe query texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeQueries {
    texts: HashSet<String>,
}

impl SafeQueries {
    /// Returns true if the template text is registered. Comparison is exact.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    /// Number of registered texts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Collects safe query texts from modules.
#[derive(Debug, Default)]
pub struct SafeQueriesBuilder {
    texts: HashSet<String>,
}

impl SafeQueriesBuilder {
    /// Creates a builder holding the core's own queries.
    #[must_use]
    pub fn new() -> Self {
        Self::default().register(&CoreSafeQueries)
    }

    /// Adds every query of a module.
    #[must_use]
    pub fn register(mut self, set: &dyn SafeQuerySet) -> Self {
        let queries = set.queries();
        tracing::debug!(module = set.name(), count = queries.len(), "registering safe queries");
        self.texts.extend(queries.into_iter().map(str::to_string));
        self
    }

    /// Adds a single query text.
    #[must_use]
    pub fn add(mut self, text: impl Into<String>) -> Self {
        self.texts.insert(text.into());
        self
    }

    /// Freezes the collected texts.
    #[must_use]
    pub fn build(self) -> SafeQueries {
        SafeQueries { texts: self.texts }
    }

    /// Freezes the collected texts and installs them process-wide.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperation`] if a set is already installed,
    /// including the default one handed out by [`safe_queries`].
    pub fn install(self) -> QueryResult<Arc<SafeQueries>> {
        let set = Arc::new(self.build());
        INSTALLED
            .set(Arc::clone(&set))
            .map_err(|_| QueryError::invalid_operation("safe queries are already installed"))?;
        Ok(set)
    }
}

/// The process-wide safe queries.
///
/// Falls back to the core's own queries, and fixes that choice, if nothing
/// was installed first.
#[must_use]
pub fn safe_queries() -> Arc<SafeQueries> {
    Arc::clone(INSTALLED.get_or_init(|| Arc::new(SafeQueriesBuilder::new().build())))
}

/// Templates the core itself runs as the system user.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreSafeQueries;

impl CoreSafeQueries {
    /// Direct children of a folder.
    pub const CHILDREN: &'static str = "+InFolder:@0 .SORT:Name";
    /// Content of a type below a subtree.
    pub const TYPE_IN_TREE: &'static str = "+TypeIs:@0 +InTree:@1";
    /// Content by exact path.
    pub const BY_PATH: &'static str = "+Path:@0";
    /// Users by login name.
    pub const USER_BY_NAME: &'static str = "+TypeIs:User +Name:@0";
    /// Content types in name order.
    pub const CONTENT_TYPES: &'static str = "+TypeIs:ContentType .AUTOFILTERS:OFF .SORT:Name";
}

impl SafeQuerySet for CoreSafeQueries {
    fn name(&self) -> &'static str {
        "core"
    }

    fn queries(&self) -> Vec<&'static str> {
        vec![
            Self::CHILDREN,
            Self::TYPE_IN_TREE,
            Self::BY_PATH,
            Self::USER_BY_NAME,
            Self::CONTENT_TYPES,
        ]
    }
}
