//! Scripted meta engine.

use parking_lot::RwLock;
use sift_core::{
    ContentId, MetaAnswer, MetaQueryEngine, PermissionFilter, Query, QueryContext, QueryError,
    QueryHits, QueryResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the scripted meta engine does when asked.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaBehavior {
    /// Answers with fixed hits.
    Answer {
        /// Hits of `try_execute_query`.
        ids: Vec<ContentId>,
        /// Hits of `try_execute_query_and_project`.
        projected: Vec<String>,
    },
    /// Declines every query.
    Decline,
    /// Fails every query with the given error.
    Fail(QueryError),
}

/// A meta engine whose behavior the test sets.
#[derive(Debug)]
pub struct ScriptedMetaEngine {
    behavior: RwLock<MetaBehavior>,
    calls: AtomicUsize,
}

impl ScriptedMetaEngine {
    /// Creates an engine with a behavior.
    #[must_use]
    pub fn new(behavior: MetaBehavior) -> Self {
        Self {
            behavior: RwLock::new(behavior),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answers with fixed identifiers and no projections.
    #[must_use]
    pub fn answering(ids: Vec<ContentId>) -> Self {
        Self::new(MetaBehavior::Answer {
            ids,
            projected: Vec::new(),
        })
    }

    /// Declines everything.
    #[must_use]
    pub fn declining() -> Self {
        Self::new(MetaBehavior::Decline)
    }

    /// Fails everything with a malformed query error.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MetaBehavior::Fail(QueryError::invalid_query("", message)))
    }

    /// Replaces the behavior.
    pub fn set_behavior(&self, behavior: MetaBehavior) {
        *self.behavior.write() = behavior;
    }

    /// Number of times the engine was asked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(
        &self,
        pick: impl FnOnce(&MetaBehavior) -> Option<Vec<T>>,
    ) -> QueryResult<MetaAnswer<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.read();
        if let MetaBehavior::Fail(error) = &*behavior {
            return Err(error.clone());
        }
        Ok(match pick(&behavior) {
            Some(hits) => {
                let count = hits.len();
                MetaAnswer::Answered(QueryHits::new(hits, count))
            }
            None => MetaAnswer::NotHandled,
        })
    }
}

impl MetaQueryEngine for ScriptedMetaEngine {
    fn try_execute_query(
        &self,
        _query: &Query,
        _filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<MetaAnswer<ContentId>> {
        self.answer(|behavior| match behavior {
            MetaBehavior::Answer { ids, .. } => Some(ids.clone()),
            _ => None,
        })
    }

    fn try_execute_query_and_project(
        &self,
        _query: &Query,
        _filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<MetaAnswer<String>> {
        self.answer(|behavior| match behavior {
            MetaBehavior::Answer { projected, .. } => Some(projected.clone()),
            _ => None,
        })
    }
}
