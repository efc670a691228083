//! Engine collaborators consumed by query execution.
//!
//! The core never evaluates predicates itself. A [`QueryEngine`] answers every
//! query; an optional [`MetaQueryEngine`] answers the ones it can faster.
//! Both receive a [`PermissionFilter`] to consult per candidate hit.

use crate::error::QueryResult;
use crate::query::{Query, QueryContext};
use crate::types::ContentId;
use serde::Serialize;

/// Hits of one execution plus the total count before paging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryHits<T> {
    /// Hits after skip/top.
    pub hits: Vec<T>,
    /// Number of matching, permitted documents before skip/top.
    pub total_count: usize,
}

impl<T> QueryHits<T> {
    /// Creates a result.
    #[must_use]
    pub const fn new(hits: Vec<T>, total_count: usize) -> Self {
        Self { hits, total_count }
    }

    /// A result without hits.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total_count: 0,
        }
    }
}

/// Outcome of asking the meta engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaAnswer<T> {
    /// The meta engine answered the query.
    Answered(QueryHits<T>),
    /// The meta engine cannot answer; ask the full engine.
    NotHandled,
}

/// The full index engine.
///
/// Must return an error on genuine failure, never an empty result in its place.
pub trait QueryEngine: Send + Sync {
    /// Runs the query and returns content identifiers.
    fn execute_query(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        context: &QueryContext,
    ) -> QueryResult<QueryHits<ContentId>>;

    /// Runs the query and returns the projected field of each hit.
    fn execute_query_and_project(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        context: &QueryContext,
    ) -> QueryResult<QueryHits<String>>;
}

/// A fast engine that answers a subset of queries.
///
/// Errors are not surfaced to callers: execution logs them and falls back to
/// the full engine, same as [`MetaAnswer::NotHandled`].
pub trait MetaQueryEngine: Send + Sync {
    /// Tries to answer the query with content identifiers.
    fn try_execute_query(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        context: &QueryContext,
    ) -> QueryResult<MetaAnswer<ContentId>>;

    /// Tries to answer the query with projected values.
    fn try_execute_query_and_project(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        context: &QueryContext,
    ) -> QueryResult<MetaAnswer<String>>;
}

/// Per-hit permission check.
pub trait PermissionFilter {
    /// Returns true if the current identity may see this hit.
    fn is_permitted(
        &self,
        content_id: ContentId,
        is_last_public: bool,
        is_last_draft: bool,
    ) -> bool;
}

/// Builds a permission filter for one execution.
///
/// Called on every execute so that no filter outlives the identity it was
/// built for.
pub trait PermissionFilterFactory: Send + Sync {
    /// Creates the filter for a query run in a context.
    fn create(&self, query: &Query, context: &QueryContext) -> Box<dyn PermissionFilter>;
}

/// Filter that permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

impl PermissionFilter for PermitAll {
    fn is_permitted(
        &self,
        _content_id: ContentId,
        _is_last_public: bool,
        _is_last_draft: bool,
    ) -> bool {
        true
    }
}

impl PermissionFilterFactory for PermitAll {
    fn create(&self, _query: &Query, _context: &QueryContext) -> Box<dyn PermissionFilter> {
        Box::new(Self)
    }
}
