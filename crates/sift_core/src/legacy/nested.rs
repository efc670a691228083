//! Nested `{{ }}` fragment resolution.
//!
//! An inner fragment is a complete query whose projected hits replace it in
//! the outer text. Fragments resolve innermost first, left to right, until
//! no `}}` remains outside quoted literals.

use super::settings::move_settings_to_the_end;
use super::template::escape_value;
use crate::error::{QueryError, QueryResult};
use crate::predicate::EMPTY_INNER_QUERY;
use crate::query::{Query, QueryContext};
use serde::Serialize;
use std::ops::Range;
use tracing::debug;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A `{{ }}` fragment located in query text, by byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// The whole fragment, braces included.
    pub span: Range<usize>,
    /// The text between the braces.
    pub inner: Range<usize>,
    /// Number of fragments enclosing this one.
    pub depth: usize,
}

impl Fragment {
    /// The inner query text.
    #[must_use]
    pub fn inner_text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.inner.clone()]
    }
}

/// One resolved fragment, in resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstitutionStep {
    /// The inner query text that ran.
    pub fragment: String,
    /// What replaced the fragment.
    pub replacement: String,
}

/// Finds every fragment, ordered by closing position.
///
/// Braces inside quoted literals do not count.
///
/// # Errors
///
/// Returns [`QueryError::InvalidQuery`] on a `}}` without opening braces or
/// a `{{` that is never closed.
pub fn scan_fragments(text: &str) -> QueryResult<Vec<Fragment>> {
    let bytes = text.as_bytes();
    let mut open: Vec<usize> = Vec::new();
    let mut fragments = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(delimiter) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == delimiter {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => {
                quote = Some(b);
                i += 1;
            }
            _ if bytes[i..].starts_with(OPEN.as_bytes()) => {
                open.push(i);
                i += OPEN.len();
            }
            _ if bytes[i..].starts_with(CLOSE.as_bytes()) => {
                let start = open
                    .pop()
                    .ok_or_else(|| QueryError::invalid_query(text, "unbalanced '}}'"))?;
                fragments.push(Fragment {
                    span: start..i + CLOSE.len(),
                    inner: start + OPEN.len()..i,
                    depth: open.len(),
                });
                i += CLOSE.len();
            }
            _ => i += 1,
        }
    }

    if !open.is_empty() {
        return Err(QueryError::invalid_query(text, "unterminated '{{'"));
    }
    Ok(fragments)
}

/// Resolves fragments one at a time against a context.
pub(crate) struct NestedResolver<'c> {
    context: &'c QueryContext,
    steps: Vec<SubstitutionStep>,
}

impl<'c> NestedResolver<'c> {
    pub(crate) fn new(context: &'c QueryContext) -> Self {
        Self {
            context,
            steps: Vec::new(),
        }
    }

    pub(crate) fn into_steps(self) -> Vec<SubstitutionStep> {
        self.steps
    }

    /// Replaces fragments until none is left.
    pub(crate) fn resolve(&mut self, mut text: String) -> QueryResult<String> {
        let limit = self.context.config().max_nested_fragments;
        while text.contains(CLOSE) {
            let fragments = scan_fragments(&text)?;
            let Some(first) = fragments.into_iter().next() else {
                break;
            };
            if self.steps.len() >= limit {
                return Err(QueryError::invalid_query(
                    &text,
                    format!("more than {limit} nested queries"),
                ));
            }
            let inner = first.inner_text(&text).to_string();
            let replacement = self.execute_inner(&inner)?;
            debug!(fragment = %inner, %replacement, "resolved nested query");
            text.replace_range(first.span, &replacement);
            self.steps.push(SubstitutionStep {
                fragment: inner,
                replacement,
            });
        }
        Ok(text)
    }

    fn execute_inner(&self, inner: &str) -> QueryResult<String> {
        let relocated = move_settings_to_the_end(inner);
        let mut query = Query::parse(&relocated, self.context.field_info())
            .map_err(|e| e.with_query_text(inner))?;
        if query.projection.is_none() {
            query.projection = Some(self.context.config().inner_projection_field.clone());
        }
        let hits = query
            .execute_and_project(self.context)
            .map_err(|e| e.with_query_text(inner))?;

        let mut values: Vec<String> = hits.hits.iter().map(|hit| escape_value(hit)).collect();
        Ok(match values.len() {
            0 => EMPTY_INNER_QUERY.to_string(),
            1 => values.pop().unwrap_or_default(),
            _ => format!("({})", values.join(" ")),
        })
    }
}
