//! Test fixtures and context helpers.
//!
//! [`ContentBuilder`] assembles index documents the way a repository would
//! at commit time; [`sample_repository`] is a small content tree most
//! integration tests run against.

use crate::engine::ScanEngine;
use chrono::{DateTime, TimeZone, Utc};
use sift_core::document::names;
use sift_core::{
    ContentId, IndexDocument, IndexField, IndexValue, PostponedValues, QueryConfig, QueryContext,
};
use std::sync::Arc;

/// Builds the index document of one content version.
#[derive(Debug, Clone)]
pub struct ContentBuilder {
    id: ContentId,
    parent_id: ContentId,
    path: String,
    type_name: String,
    is_system: bool,
    is_last_public: bool,
    is_last_draft: bool,
    lifespan: Option<(DateTime<Utc>, DateTime<Utc>)>,
    text: Option<String>,
    extra: Vec<IndexField>,
}

impl ContentBuilder {
    /// Starts a document for content at `path` with a content type name.
    pub fn new(id: ContentId, path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: 0,
            path: path.into(),
            type_name: type_name.into(),
            is_system: false,
            is_last_public: true,
            is_last_draft: true,
            lifespan: None,
            text: None,
            extra: Vec::new(),
        }
    }

    /// Sets the parent.
    #[must_use]
    pub const fn parent(mut self, parent_id: ContentId) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Marks the content as system content.
    #[must_use]
    pub const fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Sets the last-version flags.
    #[must_use]
    pub const fn last_versions(mut self, is_last_public: bool, is_last_draft: bool) -> Self {
        self.is_last_public = is_last_public;
        self.is_last_draft = is_last_draft;
        self
    }

    /// Enables the lifespan window `[from, till)`.
    #[must_use]
    pub const fn lifespan(mut self, from: DateTime<Utc>, till: DateTime<Utc>) -> Self {
        self.lifespan = Some((from, till));
        self
    }

    /// Sets the full-text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds any other field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        self.extra.push(IndexField::new(name, value));
        self
    }

    /// Assembles the document and completes its structural fields.
    #[must_use]
    pub fn build(self) -> IndexDocument {
        let mut document = IndexDocument::new();
        document.add_value(names::ID, self.id);
        document.add_value(names::VERSION_ID, self.id * 10);
        document.add_value(names::TYPE, self.type_name.as_str());
        document.add_value(
            names::TYPE_IS,
            vec![self.type_name.to_lowercase(), "genericcontent".to_string()],
        );
        document.add_value(names::IS_LAST_PUBLIC, self.is_last_public);
        document.add_value(names::IS_LAST_DRAFT, self.is_last_draft);

        let (enabled, from, till) = match self.lifespan {
            Some((from, till)) => (true, from, till),
            None => (false, IndexValue::min_date(), IndexValue::min_date()),
        };
        document.add_value(names::ENABLE_LIFESPAN, enabled);
        document.add_value(names::VALID_FROM, from);
        document.add_value(names::VALID_TILL, till);

        let name = self
            .path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let text = self.text.unwrap_or_else(|| name.clone());
        document.add_value(names::ALL_TEXT, text);
        for field in self.extra {
            document.add(field);
        }
        document.complete(&PostponedValues {
            name,
            path: self.path,
            parent_id: self.parent_id,
            is_system: self.is_system,
        });
        document
    }
}

/// A date in the sample data, at midnight UTC.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_else(IndexValue::min_date)
}

/// A small content tree.
///
/// | id | path | type | notes |
/// |----|------|------|-------|
/// | 1 | /Root | Folder | |
/// | 2 | /Root/System | SystemFolder | system |
/// | 3 | /Root/Docs | Folder | |
/// | 4 | /Root/Docs/Report.docx | File | full text "Quarterly report" |
/// | 5 | /Root/Docs/Notes.txt | File | |
/// | 6 | /Root/Docs/Archive | Folder | |
/// | 7 | /Root/Docs/Archive/Old.txt | File | lifespan ended 2000-01-01 |
/// | 8 | /Root/IMS | Folder | |
/// | 9 | /Root/IMS/admin | User | |
/// | 10 | /Root/System/ContentTypes | SystemFolder | system |
/// | 11 | /Root/System/ContentTypes/File | ContentType | system |
#[must_use]
pub fn sample_repository() -> Vec<IndexDocument> {
    vec![
        ContentBuilder::new(1, "/Root", "Folder").build(),
        ContentBuilder::new(2, "/Root/System", "SystemFolder").parent(1).system().build(),
        ContentBuilder::new(3, "/Root/Docs", "Folder").parent(1).build(),
        ContentBuilder::new(4, "/Root/Docs/Report.docx", "File")
            .parent(3)
            .text("Quarterly report")
            .field("Index", 2)
            .build(),
        ContentBuilder::new(5, "/Root/Docs/Notes.txt", "File")
            .parent(3)
            .field("Index", 1)
            .build(),
        ContentBuilder::new(6, "/Root/Docs/Archive", "Folder").parent(3).build(),
        ContentBuilder::new(7, "/Root/Docs/Archive/Old.txt", "File")
            .parent(6)
            .lifespan(date(1990, 1, 1), date(2000, 1, 1))
            .build(),
        ContentBuilder::new(8, "/Root/IMS", "Folder").parent(1).build(),
        ContentBuilder::new(9, "/Root/IMS/admin", "User").parent(8).build(),
        ContentBuilder::new(10, "/Root/System/ContentTypes", "SystemFolder")
            .parent(2)
            .system()
            .build(),
        ContentBuilder::new(11, "/Root/System/ContentTypes/File", "ContentType")
            .parent(10)
            .system()
            .build(),
    ]
}

/// A scan engine loaded with [`sample_repository`].
#[must_use]
pub fn sample_engine() -> Arc<ScanEngine> {
    let engine = ScanEngine::new();
    for document in sample_repository() {
        // Every sample document carries an Id.
        let _ = engine.insert(document);
    }
    Arc::new(engine)
}

/// A context over the sample engine for a regular user.
#[must_use]
pub fn sample_context() -> (Arc<ScanEngine>, QueryContext) {
    let engine = sample_engine();
    let context = QueryContext::new(engine.clone())
        .with_config(QueryConfig::default())
        .with_user(1000);
    (engine, context)
}
