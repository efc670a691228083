//! Per-field indexing information.
//!
//! The parser asks a [`FieldInfoProvider`] how a field is indexed so that
//! query text like `Id:42` becomes an `Int32` term rather than text.

use crate::document::{names, IndexingMode, StoringMode, TermVector};
use serde::Serialize;
use sift_codec::IndexValueType;
use std::collections::HashMap;

/// How one field is typed and indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldIndexingInfo {
    /// Value type of the field.
    pub value_type: IndexValueType,
    /// Indexing mode.
    pub indexing: IndexingMode,
    /// Storing mode.
    pub storing: StoringMode,
    /// Term vector mode.
    pub term_vector: TermVector,
}

impl FieldIndexingInfo {
    /// Creates info with default directives.
    #[must_use]
    pub const fn new(value_type: IndexValueType) -> Self {
        Self {
            value_type,
            indexing: IndexingMode::Default,
            storing: StoringMode::Default,
            term_vector: TermVector::Default,
        }
    }

    /// Sets the indexing mode.
    #[must_use]
    pub const fn with_indexing(mut self, mode: IndexingMode) -> Self {
        self.indexing = mode;
        self
    }

    /// Sets the storing mode.
    #[must_use]
    pub const fn with_storing(mut self, mode: StoringMode) -> Self {
        self.storing = mode;
        self
    }
}

impl Default for FieldIndexingInfo {
    fn default() -> Self {
        Self::new(IndexValueType::Text)
    }
}

/// Source of per-field indexing information.
pub trait FieldInfoProvider: Send + Sync {
    /// Returns the info of a field, or `None` if the field is unknown.
    ///
    /// Unknown fields are treated as analyzed text.
    fn field_info(&self, field_name: &str) -> Option<FieldIndexingInfo>;

    /// Value type used to parse query text for this field.
    fn value_type(&self, field_name: &str) -> IndexValueType {
        self.field_info(field_name)
            .map_or(IndexValueType::Text, |info| info.value_type)
    }
}

/// Provider that knows the structural fields and whatever is registered on top.
#[derive(Debug, Clone)]
pub struct BuiltinFieldInfo {
    fields: HashMap<String, FieldIndexingInfo>,
}

impl BuiltinFieldInfo {
    /// Creates a provider with the structural fields.
    #[must_use]
    pub fn new() -> Self {
        let not_analyzed = |t| FieldIndexingInfo::new(t).with_indexing(IndexingMode::NotAnalyzed);
        let stored = |t| not_analyzed(t).with_storing(StoringMode::Yes);

        let mut fields = HashMap::new();
        for name in [
            names::ID,
            names::VERSION_ID,
            names::PARENT_ID,
            names::DEPTH,
            names::OWNER_ID,
        ] {
            fields.insert(name.to_string(), stored(IndexValueType::Int32));
        }
        for name in [
            names::IS_SYSTEM,
            names::IS_LAST_PUBLIC,
            names::IS_LAST_DRAFT,
            names::ENABLE_LIFESPAN,
        ] {
            fields.insert(name.to_string(), not_analyzed(IndexValueType::Bool));
        }
        for name in [
            names::VALID_FROM,
            names::VALID_TILL,
            names::CREATION_DATE,
            names::MODIFICATION_DATE,
        ] {
            fields.insert(name.to_string(), stored(IndexValueType::DateTime));
        }
        for name in [names::IN_TREE, names::TYPE_IS] {
            fields.insert(name.to_string(), not_analyzed(IndexValueType::TextArray));
        }
        for name in [names::NAME, names::PATH, names::IN_FOLDER, names::TYPE] {
            fields.insert(name.to_string(), stored(IndexValueType::Text));
        }
        fields.insert(
            names::ALL_TEXT.to_string(),
            FieldIndexingInfo::new(IndexValueType::Text).with_indexing(IndexingMode::Analyzed),
        );
        Self { fields }
    }

    /// Registers or replaces the info of a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, info: FieldIndexingInfo) -> Self {
        self.fields.insert(name.into(), info);
        self
    }
}

impl Default for BuiltinFieldInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldInfoProvider for BuiltinFieldInfo {
    fn field_info(&self, field_name: &str) -> Option<FieldIndexingInfo> {
        self.fields.get(field_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_fields_are_typed() {
        let info = BuiltinFieldInfo::new();
        assert_eq!(info.value_type("Id"), IndexValueType::Int32);
        assert_eq!(info.value_type("IsSystem"), IndexValueType::Bool);
        assert_eq!(info.value_type("ValidTill"), IndexValueType::DateTime);
        assert_eq!(info.value_type("InTree"), IndexValueType::TextArray);
    }

    #[test]
    fn unknown_fields_are_text() {
        let info = BuiltinFieldInfo::new();
        assert!(info.field_info("Description").is_none());
        assert_eq!(info.value_type("Description"), IndexValueType::Text);
    }

    #[test]
    fn registered_fields_override() {
        let info = BuiltinFieldInfo::new()
            .with_field("Index", FieldIndexingInfo::new(IndexValueType::Int32));
        assert_eq!(info.value_type("Index"), IndexValueType::Int32);
    }
}
