//! Permission filters for tests.

use parking_lot::RwLock;
use sift_core::{ContentId, PermissionFilter, PermissionFilterFactory, Query, QueryContext};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hides a fixed set of content and, optionally, drafts.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    denied: HashSet<ContentId>,
    public_only: bool,
}

impl DenyList {
    /// Denies the given identifiers.
    pub fn new(denied: impl IntoIterator<Item = ContentId>) -> Self {
        Self {
            denied: denied.into_iter().collect(),
            public_only: false,
        }
    }

    /// Also hides versions that are not the last public one.
    #[must_use]
    pub const fn public_only(mut self) -> Self {
        self.public_only = true;
        self
    }
}

impl PermissionFilter for DenyList {
    fn is_permitted(
        &self,
        content_id: ContentId,
        is_last_public: bool,
        _is_last_draft: bool,
    ) -> bool {
        !self.denied.contains(&content_id) && (!self.public_only || is_last_public)
    }
}

/// Builds a [`DenyList`] snapshot on every execution.
///
/// The deny set can change between executions; each filter sees the set as
/// it was when the filter was created.
#[derive(Debug, Default)]
pub struct DenyListFactory {
    denied: RwLock<HashSet<ContentId>>,
    created: AtomicUsize,
}

impl DenyListFactory {
    /// Creates a factory denying nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Denies one more identifier for filters created from now on.
    pub fn deny(&self, content_id: ContentId) {
        self.denied.write().insert(content_id);
    }

    /// Allows an identifier again.
    pub fn allow(&self, content_id: ContentId) {
        self.denied.write().remove(&content_id);
    }

    /// Number of filters created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl PermissionFilterFactory for DenyListFactory {
    fn create(&self, _query: &Query, _context: &QueryContext) -> Box<dyn PermissionFilter> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(DenyList::new(self.denied.read().iter().copied()))
    }
}
