//! Compiled queries, preparation and dispatch.
//!
//! A [`Query`] is built by the parser (or from a predicate), prepared exactly
//! once and then executed any number of times:
//!
//! 1. a fresh permission filter is built by the context's factory
//! 2. implicit filters are injected (once per query)
//! 3. the meta engine is asked; declining or failing both fall through
//! 4. the full engine answers, its errors propagate unchanged

mod context;
mod filters;

pub use context::QueryContext;
pub use filters::{autofilter_text, lifespan_filter_text};

use crate::config::QueryConfig;
use crate::engine::{MetaAnswer, MetaQueryEngine, PermissionFilter, QueryHits};
use crate::error::{QueryError, QueryResult};
use crate::field_info::FieldInfoProvider;
use crate::predicate::{to_text, LogicalClause, LogicalPredicate, Occurrence, Predicate, QueryInfo};
use crate::types::{ContentId, FilterStatus, QueryExecutionMode, SortInfo};
use std::fmt::Write as _;
use tracing::debug;

/// A compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    query_text: String,
    /// Field returned per hit by projected execution.
    pub projection: Option<String>,
    /// Maximum number of hits (0 = unbounded).
    pub top: usize,
    /// Number of hits to skip.
    pub skip: usize,
    /// Sort keys in priority order.
    pub sort: Vec<SortInfo>,
    /// Autofilter switch.
    pub enable_autofilters: FilterStatus,
    /// Lifespan filter switch.
    pub enable_lifespan_filter: FilterStatus,
    /// Only the total count is needed.
    pub count_only: bool,
    /// Include every version, not just the last ones.
    pub all_versions: bool,
    /// Execution-mode hint for the engines.
    pub execution_mode: QueryExecutionMode,
    predicate: Predicate,
    filters_prepared: bool,
}

impl Query {
    /// Creates a query around a predicate with default settings.
    #[must_use]
    pub fn new(predicate: Predicate) -> Self {
        Self {
            query_text: to_text(&predicate),
            projection: None,
            top: 0,
            skip: 0,
            sort: Vec::new(),
            enable_autofilters: FilterStatus::Default,
            enable_lifespan_filter: FilterStatus::Default,
            count_only: false,
            all_versions: false,
            execution_mode: QueryExecutionMode::Default,
            predicate,
            filters_prepared: false,
        }
    }

    /// Parses query text. See [`crate::parser::parse`].
    pub fn parse(text: &str, fields: &dyn FieldInfoProvider) -> QueryResult<Self> {
        crate::parser::parse(text, fields)
    }

    pub(crate) fn set_query_text(&mut self, text: &str) {
        self.query_text = text.to_string();
    }

    /// The text the query was parsed from.
    #[must_use]
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// The predicate tree, including injected filters once prepared.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Consumes the query, returning its predicate tree.
    #[must_use]
    pub fn into_predicate(self) -> Predicate {
        self.predicate
    }

    /// Returns true once implicit filters have been injected.
    #[must_use]
    pub const fn is_prepared(&self) -> bool {
        self.filters_prepared
    }

    /// Replaces the tree with `(old AND predicate)`: both clauses `Must`.
    pub fn add_and_clause(&mut self, predicate: Predicate) {
        self.combine(predicate, Occurrence::Must);
    }

    /// Replaces the tree with `(old OR predicate)`: both clauses `Should`.
    pub fn add_or_clause(&mut self, predicate: Predicate) {
        self.combine(predicate, Occurrence::Should);
    }

    fn combine(&mut self, predicate: Predicate, occurrence: Occurrence) {
        let old = self.take_predicate();
        self.predicate = Predicate::pair(old, predicate, occurrence);
    }

    fn take_predicate(&mut self) -> Predicate {
        std::mem::replace(
            &mut self.predicate,
            Predicate::Logical(LogicalPredicate::default()),
        )
    }

    /// Injects the implicit filters. Later calls do nothing.
    ///
    /// With autofilters on the tree becomes `+(tree) +IsSystem:no`; with the
    /// lifespan filter on, the lifespan window is conjoined as well.
    pub fn prepare(&mut self, config: &QueryConfig) -> QueryResult<()> {
        if self.filters_prepared {
            return Ok(());
        }
        let autofilters = self
            .enable_autofilters
            .is_enabled(config.autofilters_by_default);
        let lifespan = self
            .enable_lifespan_filter
            .is_enabled(config.lifespan_by_default);

        if autofilters || lifespan {
            let mut injected = Vec::with_capacity(2);
            if autofilters {
                injected.push(filters::autofilter()?.clone());
            }
            if lifespan {
                injected.push(filters::lifespan_filter()?.clone());
            }
            let mut clauses = vec![LogicalClause::new(self.take_predicate(), Occurrence::Must)];
            clauses.extend(
                injected
                    .into_iter()
                    .map(|filter| LogicalClause::new(filter, Occurrence::Must)),
            );
            self.predicate = Predicate::Logical(LogicalPredicate::new(clauses));
        }
        self.filters_prepared = true;
        Ok(())
    }

    /// Runs the query for content identifiers.
    ///
    /// # Errors
    ///
    /// Propagates full engine errors unchanged. Meta engine errors never
    /// surface.
    pub fn execute(&mut self, context: &QueryContext) -> QueryResult<QueryHits<ContentId>> {
        self.dispatch(
            context,
            |meta, query, filter| meta.try_execute_query(query, filter, context),
            |query, filter| context.query_engine().execute_query(query, filter, context),
        )
    }

    /// Runs the query for the projected field of each hit.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperation`] without a projection field,
    /// otherwise as [`Query::execute`].
    pub fn execute_and_project(
        &mut self,
        context: &QueryContext,
    ) -> QueryResult<QueryHits<String>> {
        if self.projection.is_none() {
            return Err(QueryError::invalid_operation(
                "projected execution needs a projection field",
            ));
        }
        self.dispatch(
            context,
            |meta, query, filter| meta.try_execute_query_and_project(query, filter, context),
            |query, filter| {
                context
                    .query_engine()
                    .execute_query_and_project(query, filter, context)
            },
        )
    }

    fn dispatch<T>(
        &mut self,
        context: &QueryContext,
        meta: impl FnOnce(
            &dyn MetaQueryEngine,
            &Query,
            &dyn PermissionFilter,
        ) -> QueryResult<MetaAnswer<T>>,
        full: impl FnOnce(&Query, &dyn PermissionFilter) -> QueryResult<QueryHits<T>>,
    ) -> QueryResult<QueryHits<T>> {
        let filter = context.filter_factory().create(self, context);
        self.prepare(context.config())?;

        if let Some(engine) = context.meta_engine() {
            match meta(engine, self, filter.as_ref()) {
                Ok(MetaAnswer::Answered(hits)) => return Ok(hits),
                Ok(MetaAnswer::NotHandled) => {
                    debug!(query = %self.query_text, "meta engine declined, using full engine");
                }
                Err(error) => {
                    debug!(
                        query = %self.query_text,
                        %error,
                        "meta engine failed, using full engine"
                    );
                }
            }
        }
        full(self, filter.as_ref())
    }

    /// Classifies the predicate tree and sort keys.
    #[must_use]
    pub fn info(&self) -> QueryInfo {
        QueryInfo::classify(&self.predicate, &self.sort)
    }

    /// Renders the predicate and settings as canonical query text.
    ///
    /// Parsing the result yields an equivalent query.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = to_text(&self.predicate);
        if let Some(field) = &self.projection {
            let _ = write!(out, " .SELECT:{field}");
        }
        if self.top > 0 {
            let _ = write!(out, " .TOP:{}", self.top);
        }
        if self.skip > 0 {
            let _ = write!(out, " .SKIP:{}", self.skip);
        }
        for sort in &self.sort {
            let _ = write!(out, " {sort}");
        }
        if let Some(value) = self.enable_autofilters.keyword_value() {
            let _ = write!(out, " .AUTOFILTERS:{value}");
        }
        if let Some(value) = self.enable_lifespan_filter.keyword_value() {
            let _ = write!(out, " .LIFESPAN:{value}");
        }
        if self.count_only {
            out.push_str(" .COUNTONLY");
        }
        if self.all_versions {
            out.push_str(" .ALLVERSIONS");
        }
        if self.execution_mode == QueryExecutionMode::Quick {
            out.push_str(" .QUICK");
        }
        out
    }
}

#[cfg(test)]
mod tests;
