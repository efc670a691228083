//! # Sift Core
//!
//! Query and indexing core for Sift.
//!
//! This crate provides:
//! - Index documents with typed fields and commit-time structural fields
//! - A closed predicate model with visitors, a classifier and a text writer
//! - A parser for the Lucene-like query language
//! - Query preparation with implicit autofilter and lifespan filters
//! - Dispatch to a pluggable meta engine with fallback to the full engine
//! - The text query façade: safe queries, `@N` parameters, settings
//!   relocation and nested `{{ }}` queries
//!
//! ## Usage
//!
//! ```
//! use sift_core::{BuiltinFieldInfo, Query};
//!
//! let fields = BuiltinFieldInfo::new();
//! let query = Query::parse("+TypeIs:Folder -Name:temp .TOP:10", &fields).unwrap();
//! assert_eq!(query.top, 10);
//! assert_eq!(query.info().must_count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod document;
mod engine;
mod error;
mod field_info;
pub mod legacy;
pub mod parser;
pub mod predicate;
mod query;
mod types;

pub use config::{QueryConfig, QuerySettings};
pub use document::{IndexDocument, IndexField, PostponedValues};
pub use engine::{
    MetaAnswer, MetaQueryEngine, PermissionFilter, PermissionFilterFactory, PermitAll,
    QueryEngine, QueryHits,
};
pub use error::{QueryError, QueryResult};
pub use field_info::{BuiltinFieldInfo, FieldIndexingInfo, FieldInfoProvider};
pub use legacy::{ContentQuery, ContentQueryResult, QueryParam};
pub use predicate::{Occurrence, Predicate, QueryInfo};
pub use query::{autofilter_text, lifespan_filter_text, Query, QueryContext};
pub use types::{ContentId, FilterStatus, QueryExecutionMode, SortInfo};

pub use sift_codec::{IndexValue, IndexValueType};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
