//! Text query façade.
//!
//! [`ContentQuery`] runs a query template the way callers have always
//! written them:
//!
//! 1. the system user may only run registered safe templates
//! 2. `@N` parameters are substituted
//! 3. an open block comment at the end is closed
//! 4. nested `{{ }}` fragments are resolved, innermost first
//! 5. settings keywords are moved to the end and the text is parsed
//! 6. per-call settings fill whatever the text left at its default

mod nested;
mod safe;
mod settings;
mod template;

pub use nested::{scan_fragments, Fragment, SubstitutionStep};
pub use safe::{safe_queries, CoreSafeQueries, SafeQueries, SafeQueriesBuilder, SafeQuerySet};
pub use settings::{
    add_clause, fix_multiline_comment, move_settings_to_the_end, LogicalOperator,
    RELOCATED_KEYWORDS,
};
pub use template::{escape_value, substitute_parameters, QueryParam};

use crate::config::QuerySettings;
use crate::error::{QueryError, QueryResult};
use crate::query::{Query, QueryContext};
use crate::types::{ContentId, FilterStatus, QueryExecutionMode};
use nested::NestedResolver;
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of a text query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentQueryResult<T> {
    /// Hits after skip and top.
    pub hits: Vec<T>,
    /// Matches before skip and top.
    pub total_count: usize,
    /// Nested fragments in resolution order.
    pub steps: Vec<SubstitutionStep>,
    /// The text that was finally parsed.
    pub query_text: String,
}

/// A query template with parameters and per-call settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentQuery {
    text: String,
    params: Vec<QueryParam>,
    settings: QuerySettings,
}

impl ContentQuery {
    /// Creates a query from template text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets the `@N` parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<QueryParam>) -> Self {
        self.params = params;
        self
    }

    /// Sets the per-call settings.
    #[must_use]
    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    /// The template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parameters.
    #[must_use]
    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    /// The per-call settings.
    #[must_use]
    pub const fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Returns true if the template is registered in `safe_queries`.
    #[must_use]
    pub fn is_safe(&self, safe_queries: &SafeQueries) -> bool {
        safe_queries.contains(&self.text)
    }

    /// Merges another clause into the template text. See [`add_clause`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperation`] if either text is empty.
    pub fn add_clause(&mut self, clause: &str, operator: LogicalOperator) -> QueryResult<()> {
        self.text = add_clause(&self.text, clause, operator)?;
        Ok(())
    }

    /// Runs the template for content identifiers.
    ///
    /// # Errors
    ///
    /// - [`QueryError::SecurityViolation`] for an unregistered template run
    ///   by the system user
    /// - [`QueryError::ParameterCountMismatch`] for a `@N` past the parameters
    /// - [`QueryError::InvalidQuery`] for malformed text, a misplaced
    ///   `.SELECT` or too many nested fragments
    /// - full engine errors, unchanged
    pub fn execute(&self, context: &QueryContext) -> QueryResult<ContentQueryResult<ContentId>> {
        let (query_text, steps) = self.resolve(context)?;
        let mut query = self.compile(&query_text, context)?;
        if query.projection.is_some() {
            return Err(QueryError::invalid_query(
                &query_text,
                "field projection is only allowed in nested queries",
            ));
        }
        let hits = query.execute(context)?;
        Ok(ContentQueryResult {
            hits: hits.hits,
            total_count: hits.total_count,
            steps,
            query_text,
        })
    }

    /// Runs the template for the `.SELECT` field of each hit.
    ///
    /// # Errors
    ///
    /// As [`ContentQuery::execute`]; a missing `.SELECT` is an
    /// [`QueryError::InvalidOperation`].
    pub fn execute_and_project(
        &self,
        context: &QueryContext,
    ) -> QueryResult<ContentQueryResult<String>> {
        let (query_text, steps) = self.resolve(context)?;
        let mut query = self.compile(&query_text, context)?;
        let hits = query.execute_and_project(context)?;
        Ok(ContentQueryResult {
            hits: hits.hits,
            total_count: hits.total_count,
            steps,
            query_text,
        })
    }

    /// Produces the final query text without running the outer query.
    ///
    /// Nested fragments still run against the context.
    ///
    /// # Errors
    ///
    /// As [`ContentQuery::execute`], minus the outer engine errors.
    pub fn resolve(&self, context: &QueryContext) -> QueryResult<(String, Vec<SubstitutionStep>)> {
        self.authorize(context)?;
        let text = substitute_parameters(&self.text, &self.params)?;
        let text = fix_multiline_comment(&text);

        let mut resolver = NestedResolver::new(context);
        let text = resolver.resolve(text)?;
        let text = move_settings_to_the_end(&text);
        debug!(template = %self.text, query = %text, "resolved text query");
        Ok((text, resolver.into_steps()))
    }

    fn authorize(&self, context: &QueryContext) -> QueryResult<()> {
        if context.is_system_user() && !self.is_safe(&context.safe_queries()) {
            warn!(query = %self.text, "refused unregistered query for the system user");
            return Err(QueryError::security_violation(&self.text));
        }
        Ok(())
    }

    fn compile(&self, text: &str, context: &QueryContext) -> QueryResult<Query> {
        let mut query = Query::parse(text, context.field_info())?;
        apply_settings(&mut query, &self.settings);
        Ok(query)
    }
}

/// Fills what the text left at its default from per-call settings.
fn apply_settings(query: &mut Query, settings: &QuerySettings) {
    if query.top == 0 {
        query.top = settings.top;
    }
    if query.skip == 0 {
        query.skip = settings.skip;
    }
    if query.sort.is_empty() {
        query.sort.clone_from(&settings.sort);
    }
    if query.enable_autofilters == FilterStatus::Default {
        query.enable_autofilters = settings.enable_autofilters;
    }
    if query.enable_lifespan_filter == FilterStatus::Default {
        query.enable_lifespan_filter = settings.enable_lifespan_filter;
    }
    if query.execution_mode == QueryExecutionMode::Default {
        query.execution_mode = settings.execution_mode;
    }
    query.count_only |= settings.count_only;
    query.all_versions |= settings.all_versions;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::engine::{PermissionFilter, QueryEngine, QueryHits};
    use crate::predicate::to_text;
    use crate::types::SortInfo;
    use std::sync::Arc;

    /// Answers every query with the same hits; projections with fixed values.
    struct Stub {
        projected: Vec<&'static str>,
    }

    impl QueryEngine for Stub {
        fn execute_query(
            &self,
            query: &Query,
            _filter: &dyn PermissionFilter,
            _context: &QueryContext,
        ) -> QueryResult<QueryHits<ContentId>> {
            let count = i32::try_from(query.top).unwrap_or(1).max(1);
            Ok(QueryHits::new((1..=count).collect(), 10))
        }

        fn execute_query_and_project(
            &self,
            _query: &Query,
            _filter: &dyn PermissionFilter,
            _context: &QueryContext,
        ) -> QueryResult<QueryHits<String>> {
            let hits: Vec<String> = self.projected.iter().map(|s| s.to_string()).collect();
            let count = hits.len();
            Ok(QueryHits::new(hits, count))
        }
    }

    fn context(projected: Vec<&'static str>) -> QueryContext {
        QueryContext::new(Arc::new(Stub { projected }))
            .with_safe_queries(Arc::new(SafeQueriesBuilder::new().build()))
    }

    #[test]
    fn system_user_needs_safe_template() {
        let ctx = context(vec![]).with_user(-1);
        let err = ContentQuery::new("+Name:@0")
            .with_params(vec!["admin".into()])
            .execute(&ctx)
            .unwrap_err();
        assert_eq!(err, QueryError::security_violation("+Name:@0"));

        let result = ContentQuery::new(CoreSafeQueries::BY_PATH)
            .with_params(vec!["/Root".into()])
            .execute(&ctx)
            .unwrap();
        assert_eq!(result.query_text, "+Path:\"/Root\"");
    }

    #[test]
    fn regular_user_runs_anything() {
        let ctx = context(vec![]).with_user(5);
        assert!(ContentQuery::new("+Name:@0")
            .with_params(vec!["admin".into()])
            .execute(&ctx)
            .is_ok());
    }

    #[test]
    fn nested_fragment_is_replaced_by_projection() {
        let ctx = context(vec!["7", "12"]);
        let result = ContentQuery::new("+ParentId:{{+Name:Docs}} +Type:File")
            .execute(&ctx)
            .unwrap();
        assert_eq!(result.query_text, "+ParentId:(7 12) +Type:File");
        assert_eq!(
            result.steps,
            vec![SubstitutionStep {
                fragment: "+Name:Docs".to_string(),
                replacement: "(7 12)".to_string(),
            }]
        );
    }

    #[test]
    fn empty_fragment_becomes_sentinel() {
        let ctx = context(vec![]);
        let (text, _) = ContentQuery::new("+Id:{{Name:none}}").resolve(&ctx).unwrap();
        assert_eq!(text, "+Id:$##$EMPTYINNERQUERY$##$");
    }

    #[test]
    fn fragment_limit_is_enforced() {
        let ctx = context(vec!["1"]).with_config(QueryConfig::default().max_nested_fragments(1));
        let err = ContentQuery::new("+Id:{{Name:a}} +Id:{{Name:b}}")
            .execute(&ctx)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));
    }

    #[test]
    fn inner_parse_error_names_the_fragment() {
        let ctx = context(vec![]);
        let err = ContentQuery::new("+Id:{{Name:(}}").execute(&ctx).unwrap_err();
        let QueryError::InvalidQuery { text, .. } = err else {
            panic!("expected invalid query");
        };
        assert_eq!(text, "Name:(");
    }

    #[test]
    fn projection_is_rejected_at_top_level() {
        let ctx = context(vec![]);
        let err = ContentQuery::new("Name:a .SELECT:Id").execute(&ctx).unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));

        let result = ContentQuery::new("Name:a .SELECT:Id")
            .execute_and_project(&ctx)
            .unwrap();
        assert_eq!(result.hits.len(), 0);
    }

    #[test]
    fn text_settings_win_over_call_settings() {
        let ctx = context(vec![]);
        let settings = QuerySettings::new()
            .top(2)
            .sort_by(SortInfo::ascending("Index"))
            .autofilters(FilterStatus::Disabled);

        let result = ContentQuery::new("Name:a .TOP:3")
            .with_settings(settings.clone())
            .execute(&ctx)
            .unwrap();
        assert_eq!(result.hits, vec![1, 2, 3]);

        let (text, _) = ContentQuery::new("Name:a").resolve(&ctx).unwrap();
        let mut query = Query::parse(&text, ctx.field_info()).unwrap();
        apply_settings(&mut query, &settings);
        assert_eq!(query.top, 2);
        assert_eq!(query.sort, vec![SortInfo::ascending("Index")]);
        query.prepare(ctx.config()).unwrap();
        assert_eq!(to_text(query.predicate()), "Name:a");
    }

    #[test]
    fn settings_move_after_substitution() {
        let ctx = context(vec![]);
        let (text, _) = ContentQuery::new(".TOP:@0 Name:@1")
            .with_params(vec![5.into(), "x".into()])
            .resolve(&ctx)
            .unwrap();
        assert_eq!(text, "Name:x .TOP:5");
    }

    #[test]
    fn add_clause_updates_template() {
        let mut query = ContentQuery::new("Name:a .TOP:5");
        query.add_clause("Type:File", LogicalOperator::And).unwrap();
        assert_eq!(query.text(), "+(Name:a) +(Type:File) .TOP:5");
    }
}
