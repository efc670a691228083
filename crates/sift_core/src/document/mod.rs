//! Index documents.
//!
//! An [`IndexDocument`] is assembled once per content version and handed to
//! the index engine. Two invariants hold for every document:
//!
//! - adding a field whose name is already present replaces it
//! - fields named in [`names::FORBIDDEN_FIELDS`] are dropped on add
//!
//! Structural fields listed in [`names::POSTPONED_FIELDS`] are placeholders
//! until [`IndexDocument::complete`] supplies their commit-time values.

mod codec;
mod field;
pub mod names;

pub use field::{IndexField, IndexingMode, StoringMode, Term, TermVector};

use crate::error::{QueryError, QueryResult};
use crate::types::ContentId;
use chrono::{DateTime, Utc};
use sift_codec::{IndexValue, IndexValueType};
use std::collections::HashMap;

/// Commit-time values of the postponed structural fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostponedValues {
    /// Content name.
    pub name: String,
    /// Repository path, e.g. `/Root/Sites/Default`.
    pub path: String,
    /// Parent content identifier.
    pub parent_id: ContentId,
    /// System content flag.
    pub is_system: bool,
}

/// A field-name keyed collection of indexed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDocument {
    fields: HashMap<String, IndexField>,
    not_indexed: bool,
}

impl IndexDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the sentinel for content that must never be searchable.
    ///
    /// The sentinel ignores every added field.
    #[must_use]
    pub fn not_indexed() -> Self {
        Self {
            fields: HashMap::new(),
            not_indexed: true,
        }
    }

    /// Returns false for the [`IndexDocument::not_indexed`] sentinel.
    #[must_use]
    pub const fn should_index(&self) -> bool {
        !self.not_indexed
    }

    /// Adds a field, replacing any field with the same name.
    ///
    /// Returns false if the field was dropped, either because its name is
    /// forbidden or because this is the not-indexed sentinel.
    pub fn add(&mut self, field: IndexField) -> bool {
        if self.not_indexed || names::is_forbidden(field.name()) {
            return false;
        }
        self.fields.insert(field.name().to_string(), field);
        true
    }

    /// Adds a field with default directives.
    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<IndexValue>) -> bool {
        self.add(IndexField::new(name, value))
    }

    /// Removes a field. Absent names are a no-op.
    pub fn remove(&mut self, name: &str) -> Option<IndexField> {
        self.fields.remove(name)
    }

    /// Returns true if the document has a field with this name.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexField> {
        self.fields.get(name)
    }

    /// Iterates the fields in unspecified order.
    pub fn fields(&self) -> impl Iterator<Item = &IndexField> {
        self.fields.values()
    }

    /// Returns the field names in unspecified order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn typed(&self, name: &str, expected: IndexValueType) -> QueryResult<Option<&IndexValue>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(field) if field.value().value_type() == expected => Ok(Some(field.value())),
            Some(field) => Err(QueryError::TypeMismatch {
                field: name.to_string(),
                expected,
                actual: field.value().value_type(),
            }),
        }
    }

    /// Text value of a field, or `""` if absent.
    pub fn get_string_value(&self, name: &str) -> QueryResult<&str> {
        Ok(self
            .typed(name, IndexValueType::Text)?
            .and_then(IndexValue::as_text)
            .unwrap_or(""))
    }

    /// Text array of a field, or empty if absent.
    pub fn get_string_array_value(&self, name: &str) -> QueryResult<&[String]> {
        Ok(self
            .typed(name, IndexValueType::TextArray)?
            .and_then(IndexValue::as_text_array)
            .unwrap_or(&[]))
    }

    /// Boolean value of a field, or `false` if absent.
    pub fn get_boolean_value(&self, name: &str) -> QueryResult<bool> {
        Ok(self
            .typed(name, IndexValueType::Bool)?
            .and_then(IndexValue::as_bool)
            .unwrap_or(false))
    }

    /// `Int32` value of a field, or 0 if absent.
    pub fn get_integer_value(&self, name: &str) -> QueryResult<i32> {
        Ok(self
            .typed(name, IndexValueType::Int32)?
            .and_then(IndexValue::as_int32)
            .unwrap_or(0))
    }

    /// `Int32Array` value of a field, or empty if absent.
    pub fn get_integer_array_value(&self, name: &str) -> QueryResult<&[i32]> {
        Ok(self
            .typed(name, IndexValueType::Int32Array)?
            .and_then(IndexValue::as_int32_array)
            .unwrap_or(&[]))
    }

    /// `Int64` value of a field, or 0 if absent.
    pub fn get_long_value(&self, name: &str) -> QueryResult<i64> {
        Ok(self
            .typed(name, IndexValueType::Int64)?
            .and_then(IndexValue::as_int64)
            .unwrap_or(0))
    }

    /// `Float32` value of a field, or 0 if absent.
    pub fn get_single_value(&self, name: &str) -> QueryResult<f32> {
        Ok(self
            .typed(name, IndexValueType::Float32)?
            .and_then(IndexValue::as_float32)
            .unwrap_or(0.0))
    }

    /// `Float64` value of a field, or 0 if absent.
    pub fn get_double_value(&self, name: &str) -> QueryResult<f64> {
        Ok(self
            .typed(name, IndexValueType::Float64)?
            .and_then(IndexValue::as_float64)
            .unwrap_or(0.0))
    }

    /// Date-time value of a field, or the minimum date if absent.
    pub fn get_date_time_value(&self, name: &str) -> QueryResult<DateTime<Utc>> {
        Ok(self
            .typed(name, IndexValueType::DateTime)?
            .and_then(IndexValue::as_date_time)
            .unwrap_or_else(IndexValue::min_date))
    }

    /// Writes the commit-time values of the postponed structural fields.
    ///
    /// Paths are indexed lowercased. `InTree` holds every ancestor path
    /// including the content's own, `InFolder` the parent path.
    pub fn complete(&mut self, values: &PostponedValues) {
        if self.not_indexed {
            return;
        }
        let path = values.path.trim_end_matches('/').to_lowercase();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut in_tree = Vec::with_capacity(segments.len());
        let mut current = String::new();
        for segment in &segments {
            current.push('/');
            current.push_str(segment);
            in_tree.push(current.clone());
        }
        let in_folder = match path.rfind('/') {
            Some(idx) if idx > 0 => path[..idx].to_string(),
            _ => String::new(),
        };
        let depth = i32::try_from(segments.len().saturating_sub(1)).unwrap_or(i32::MAX);

        self.add(
            IndexField::new(names::NAME, values.name.to_lowercase())
                .with_indexing(IndexingMode::NotAnalyzed)
                .with_storing(StoringMode::Yes),
        );
        self.add(
            IndexField::new(names::PATH, path.clone())
                .with_indexing(IndexingMode::NotAnalyzed)
                .with_storing(StoringMode::Yes),
        );
        self.add(IndexField::new(names::IN_TREE, in_tree).with_indexing(IndexingMode::NotAnalyzed));
        self.add(
            IndexField::new(names::IN_FOLDER, in_folder).with_indexing(IndexingMode::NotAnalyzed),
        );
        self.add(IndexField::new(names::DEPTH, depth).with_storing(StoringMode::Yes));
        self.add(
            IndexField::new(names::PARENT_ID, values.parent_id).with_storing(StoringMode::Yes),
        );
        self.add(IndexField::new(names::IS_SYSTEM, values.is_system));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut doc = IndexDocument::new();
        doc.add_value("Title", "first");
        doc.add_value("Title", "second");

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_string_value("Title").unwrap(), "second");
    }

    #[test]
    fn forbidden_fields_are_dropped() {
        let mut doc = IndexDocument::new();
        assert!(!doc.add_value("Password", "hunter2"));
        assert!(!doc.add_value("PASSWORDHASH", "abc"));
        assert!(doc.add_value("Name", "user1"));

        assert!(!doc.has_field("Password"));
        assert!(doc.field_names().all(|name| !names::is_forbidden(name)));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn not_indexed_sentinel_ignores_fields() {
        let mut doc = IndexDocument::not_indexed();
        assert!(!doc.should_index());
        assert!(!doc.add_value("Name", "secret"));
        doc.complete(&PostponedValues {
            name: "x".into(),
            path: "/Root/x".into(),
            parent_id: 2,
            is_system: false,
        });
        assert!(doc.is_empty());
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut doc = IndexDocument::new();
        assert!(doc.remove("Missing").is_none());
        doc.add_value("Id", 5);
        assert!(doc.remove("Id").is_some());
        assert!(doc.is_empty());
    }

    #[test]
    fn typed_accessors() {
        let mut doc = IndexDocument::new();
        doc.add_value("Id", 42);
        doc.add_value("Size", 10_000_000_000i64);
        doc.add_value("Hidden", true);
        doc.add_value("Rate", 0.5f64);

        assert_eq!(doc.get_integer_value("Id").unwrap(), 42);
        assert_eq!(doc.get_long_value("Size").unwrap(), 10_000_000_000);
        assert!(doc.get_boolean_value("Hidden").unwrap());
        assert_eq!(doc.get_double_value("Rate").unwrap(), 0.5);
    }

    #[test]
    fn absent_fields_yield_zero_values() {
        let doc = IndexDocument::new();
        assert_eq!(doc.get_string_value("X").unwrap(), "");
        assert!(doc.get_string_array_value("X").unwrap().is_empty());
        assert_eq!(doc.get_integer_value("X").unwrap(), 0);
        assert!(!doc.get_boolean_value("X").unwrap());
        assert_eq!(doc.get_date_time_value("X").unwrap(), IndexValue::min_date());
    }

    #[test]
    fn type_mismatch_is_reported() {
        let mut doc = IndexDocument::new();
        doc.add_value("Id", 42);
        assert_eq!(
            doc.get_string_value("Id"),
            Err(QueryError::TypeMismatch {
                field: "Id".into(),
                expected: IndexValueType::Text,
                actual: IndexValueType::Int32,
            })
        );
    }

    #[test]
    fn complete_fills_structural_fields() {
        let mut doc = IndexDocument::new();
        doc.complete(&PostponedValues {
            name: "Report.docx".into(),
            path: "/Root/Sites/Docs/Report.docx".into(),
            parent_id: 17,
            is_system: false,
        });

        assert_eq!(doc.get_string_value(names::NAME).unwrap(), "report.docx");
        assert_eq!(
            doc.get_string_value(names::PATH).unwrap(),
            "/root/sites/docs/report.docx"
        );
        assert_eq!(
            doc.get_string_array_value(names::IN_TREE).unwrap(),
            &[
                "/root".to_string(),
                "/root/sites".to_string(),
                "/root/sites/docs".to_string(),
                "/root/sites/docs/report.docx".to_string(),
            ]
        );
        assert_eq!(
            doc.get_string_value(names::IN_FOLDER).unwrap(),
            "/root/sites/docs"
        );
        assert_eq!(doc.get_integer_value(names::DEPTH).unwrap(), 3);
        assert_eq!(doc.get_integer_value(names::PARENT_ID).unwrap(), 17);
        assert!(!doc.get_boolean_value(names::IS_SYSTEM).unwrap());
    }

    #[test]
    fn complete_root() {
        let mut doc = IndexDocument::new();
        doc.complete(&PostponedValues {
            name: "Root".into(),
            path: "/Root".into(),
            parent_id: 0,
            is_system: true,
        });
        assert_eq!(doc.get_integer_value(names::DEPTH).unwrap(), 0);
        assert_eq!(doc.get_string_value(names::IN_FOLDER).unwrap(), "");
        assert!(doc.get_boolean_value(names::IS_SYSTEM).unwrap());
        assert!(names::POSTPONED_FIELDS.iter().all(|name| doc.get(name).is_some()));
    }
}
