//! Parse command implementation.

use super::{emit, CliError, Format};
use serde::Serialize;
use sift_core::predicate::to_text;
use sift_core::{BuiltinFieldInfo, Query, QueryConfig};
use tracing::debug;

/// A parsed query, as printed.
#[derive(Debug, Serialize)]
pub struct ParseResult {
    /// Predicate and settings as canonical text.
    pub canonical: String,
    /// The predicate alone.
    pub predicate: String,
    /// Page size, 0 for unlimited.
    pub top: usize,
    /// Hits skipped.
    pub skip: usize,
    /// Sort keys in order, as keywords.
    pub sort: Vec<String>,
    /// Projected field of a nested query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    /// Whether the implicit filters were injected.
    pub prepared: bool,
}

/// Parses `text` with the builtin field info.
pub fn parse(text: &str, prepare: bool) -> Result<ParseResult, CliError> {
    let mut query = Query::parse(text, &BuiltinFieldInfo::new())?;
    if prepare {
        query.prepare(&QueryConfig::default())?;
    }
    Ok(ParseResult {
        canonical: query.to_text(),
        predicate: to_text(query.predicate()),
        top: query.top,
        skip: query.skip,
        sort: query.sort.iter().map(ToString::to_string).collect(),
        projection: query.projection.clone(),
        prepared: prepare,
    })
}

/// Runs the parse command.
pub fn run(text: &str, prepare: bool, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    debug!(prepare, "Parsing {:?}", text);
    let result = parse(text, prepare)?;
    emit(&result, format, |result| println!("{}", result.canonical))?;
    Ok(())
}
