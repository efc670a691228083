//! # Sift Testkit
//!
//! Test utilities for Sift.
//!
//! This crate provides:
//! - An in-memory scan engine that evaluates predicates exactly
//! - A scripted meta engine and permission filters
//! - Content fixtures and a small sample repository
//! - Property-based test generators using proptest
//! - Fuzz targets for the text front end
//!
//! ## Usage
//!
//! ```
//! use sift_testkit::prelude::*;
//! use sift_core::ContentQuery;
//!
//! let (_engine, context) = sample_context();
//! let result = ContentQuery::new("+TypeIs:File .SORT:Name").execute(&context).unwrap();
//! assert_eq!(result.hits, vec![5, 7, 4]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod matching;
pub mod meta;
pub mod permissions;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::meta::*;
    pub use crate::permissions::*;
}

pub use engine::ScanEngine;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use meta::*;
pub use permissions::*;
