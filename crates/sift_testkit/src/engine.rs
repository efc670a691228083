//! In-memory scan engine.
//!
//! Evaluates every stored document against the prepared predicate. Slow,
//! but exact, so integration tests can check the whole pipeline against a
//! real answer instead of canned hits.

use crate::matching::matches;
use parking_lot::RwLock;
use sift_core::document::{names, Term};
use sift_core::{
    ContentId, IndexDocument, PermissionFilter, Query, QueryContext, QueryEngine, QueryError,
    QueryHits, QueryResult,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// A full query engine over documents kept in memory.
#[derive(Debug, Default)]
pub struct ScanEngine {
    documents: RwLock<BTreeMap<ContentId, IndexDocument>>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl ScanEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine holding the given documents.
    ///
    /// # Errors
    ///
    /// As [`ScanEngine::insert`].
    pub fn with_documents(documents: impl IntoIterator<Item = IndexDocument>) -> QueryResult<Self> {
        let engine = Self::new();
        for document in documents {
            engine.insert(document)?;
        }
        Ok(engine)
    }

    /// Stores a document under its `Id` field, replacing any previous one.
    ///
    /// Documents that should not be indexed are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperation`] if the document has no
    /// integer `Id` field.
    pub fn insert(&self, document: IndexDocument) -> QueryResult<()> {
        if !document.should_index() {
            return Ok(());
        }
        if !document.has_field(names::ID) {
            return Err(QueryError::invalid_operation("document has no Id field"));
        }
        let id = document.get_integer_value(names::ID)?;
        self.documents.write().insert(id, document);
        Ok(())
    }

    /// Removes a document.
    pub fn remove(&self, id: ContentId) -> Option<IndexDocument> {
        self.documents.write().remove(&id)
    }

    /// Removes every document whose field holds exactly the term's value.
    ///
    /// Returns the number of documents removed.
    pub fn delete_by_term(&self, term: &Term) -> usize {
        let mut documents = self.documents.write();
        let before = documents.len();
        documents.retain(|_, document| {
            document
                .get(&term.name)
                .is_none_or(|field| field.value() != &term.value)
        });
        before - documents.len()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Number of queries answered or failed so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Makes every following query fail with an engine error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    /// Stops failing queries.
    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    fn run<T>(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        extract: impl Fn(ContentId, &IndexDocument) -> Option<T>,
    ) -> QueryResult<QueryHits<T>> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(message) = self.failure.read().as_ref() {
            return Err(QueryError::engine(message.clone()));
        }

        let documents = self.documents.read();
        let mut candidates: Vec<(ContentId, &IndexDocument)> = documents
            .iter()
            .filter(|(id, document)| is_visible(query, filter, **id, document))
            .filter(|(_, document)| matches(query.predicate(), document))
            .map(|(id, document)| (*id, document))
            .collect();

        let total_count = candidates.len();
        if query.count_only {
            return Ok(QueryHits::new(Vec::new(), total_count));
        }

        if !query.sort.is_empty() {
            candidates.sort_by(|(_, a), (_, b)| compare(query, a, b));
        }
        let top = if query.top == 0 { usize::MAX } else { query.top };
        let hits = candidates
            .into_iter()
            .skip(query.skip)
            .take(top)
            .filter_map(|(id, document)| extract(id, document))
            .collect();
        Ok(QueryHits::new(hits, total_count))
    }
}

fn is_visible(
    query: &Query,
    filter: &dyn PermissionFilter,
    id: ContentId,
    document: &IndexDocument,
) -> bool {
    let is_last_public = document.get_boolean_value(names::IS_LAST_PUBLIC).unwrap_or(false);
    let is_last_draft = document.get_boolean_value(names::IS_LAST_DRAFT).unwrap_or(false);
    if !query.all_versions && !is_last_public && !is_last_draft {
        return false;
    }
    filter.is_permitted(id, is_last_public, is_last_draft)
}

/// Orders by the sort keys in turn; a missing field sorts first.
fn compare(query: &Query, a: &IndexDocument, b: &IndexDocument) -> Ordering {
    for key in &query.sort {
        let left = a.get(&key.field_name).map(|f| f.value());
        let right = b.get(&key.field_name).map(|f| f.value());
        let ordering = if key.reverse {
            right.cmp(&left)
        } else {
            left.cmp(&right)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

impl QueryEngine for ScanEngine {
    fn execute_query(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<QueryHits<ContentId>> {
        self.run(query, filter, |id, _| Some(id))
    }

    fn execute_query_and_project(
        &self,
        query: &Query,
        filter: &dyn PermissionFilter,
        _context: &QueryContext,
    ) -> QueryResult<QueryHits<String>> {
        let Some(projection) = query.projection.as_deref() else {
            return Err(QueryError::invalid_operation("query has no projection field"));
        };
        self.run(query, filter, |_, document| {
            document
                .get(projection)
                .map(|field| field.value().value_as_string().to_string())
        })
    }
}
