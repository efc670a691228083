//! Execution context.

use crate::config::QueryConfig;
use crate::engine::{MetaQueryEngine, PermissionFilterFactory, PermitAll, QueryEngine};
use crate::field_info::{BuiltinFieldInfo, FieldInfoProvider};
use crate::legacy::SafeQueries;
use crate::types::ContentId;
use std::sync::Arc;

/// Everything a query needs to run: identity, engines and configuration.
///
/// Cheap to clone; collaborators are shared.
#[derive(Clone)]
pub struct QueryContext {
    config: QueryConfig,
    user_id: ContentId,
    query_engine: Arc<dyn QueryEngine>,
    meta_engine: Option<Arc<dyn MetaQueryEngine>>,
    field_info: Arc<dyn FieldInfoProvider>,
    filter_factory: Arc<dyn PermissionFilterFactory>,
    safe_queries: Option<Arc<SafeQueries>>,
}

impl QueryContext {
    /// Creates a context around the full engine.
    ///
    /// Defaults: default configuration, user 0, no meta engine, the builtin
    /// field info, a permit-all filter and the process-wide safe queries.
    pub fn new(query_engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            config: QueryConfig::default(),
            user_id: 0,
            query_engine,
            meta_engine: None,
            field_info: Arc::new(BuiltinFieldInfo::new()),
            filter_factory: Arc::new(PermitAll),
            safe_queries: None,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the current identity.
    #[must_use]
    pub fn with_user(mut self, user_id: ContentId) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sets the meta engine.
    #[must_use]
    pub fn with_meta_engine(mut self, engine: Arc<dyn MetaQueryEngine>) -> Self {
        self.meta_engine = Some(engine);
        self
    }

    /// Sets the field info provider.
    #[must_use]
    pub fn with_field_info(mut self, provider: Arc<dyn FieldInfoProvider>) -> Self {
        self.field_info = provider;
        self
    }

    /// Sets the permission filter factory.
    #[must_use]
    pub fn with_filter_factory(mut self, factory: Arc<dyn PermissionFilterFactory>) -> Self {
        self.filter_factory = factory;
        self
    }

    /// Uses a specific safe query set instead of the process-wide one.
    #[must_use]
    pub fn with_safe_queries(mut self, safe_queries: Arc<SafeQueries>) -> Self {
        self.safe_queries = Some(safe_queries);
        self
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Current identity.
    #[must_use]
    pub const fn user_id(&self) -> ContentId {
        self.user_id
    }

    /// Returns true if the current identity is the system user.
    #[must_use]
    pub const fn is_system_user(&self) -> bool {
        self.user_id == self.config.system_user_id
    }

    /// Full engine.
    #[must_use]
    pub fn query_engine(&self) -> &dyn QueryEngine {
        self.query_engine.as_ref()
    }

    /// Meta engine, if any.
    #[must_use]
    pub fn meta_engine(&self) -> Option<&dyn MetaQueryEngine> {
        self.meta_engine.as_deref()
    }

    /// Field info provider.
    #[must_use]
    pub fn field_info(&self) -> &dyn FieldInfoProvider {
        self.field_info.as_ref()
    }

    /// Permission filter factory.
    #[must_use]
    pub fn filter_factory(&self) -> &dyn PermissionFilterFactory {
        self.filter_factory.as_ref()
    }

    /// Safe queries checked for the system user.
    #[must_use]
    pub fn safe_queries(&self) -> Arc<SafeQueries> {
        self.safe_queries
            .clone()
            .unwrap_or_else(crate::legacy::safe_queries)
    }
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("config", &self.config)
            .field("user_id", &self.user_id)
            .field("has_meta_engine", &self.meta_engine.is_some())
            .finish_non_exhaustive()
    }
}
