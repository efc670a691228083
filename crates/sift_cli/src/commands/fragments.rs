//! Fragments command implementation.

use super::{emit, CliError, Format};
use serde::Serialize;
use sift_core::legacy::scan_fragments;
use tracing::debug;

/// A nested query found in the text.
#[derive(Debug, Serialize)]
pub struct FragmentInfo {
    /// Position in resolution order.
    pub order: usize,
    /// Enclosing fragments.
    pub depth: usize,
    /// Byte offset of the opening braces.
    pub start: usize,
    /// Byte offset past the closing braces.
    pub end: usize,
    /// The inner query text.
    pub query: String,
}

/// Lists the fragments of `text` in resolution order.
pub fn fragments(text: &str) -> Result<Vec<FragmentInfo>, CliError> {
    Ok(scan_fragments(text)?
        .into_iter()
        .enumerate()
        .map(|(order, fragment)| FragmentInfo {
            order,
            depth: fragment.depth,
            start: fragment.span.start,
            end: fragment.span.end,
            query: fragment.inner_text(text).to_string(),
        })
        .collect())
}

/// Runs the fragments command.
pub fn run(text: &str, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let found = fragments(text)?;
    debug!(count = found.len(), "Scanned nested queries");
    emit(&found, format, |found| print_text_output(found))?;
    Ok(())
}

fn print_text_output(found: &[FragmentInfo]) {
    if found.is_empty() {
        println!("No nested queries");
        return;
    }
    for fragment in found {
        println!(
            "{:>3}  {:>5}..{:<5} {}{}",
            fragment.order,
            fragment.start,
            fragment.end,
            "  ".repeat(fragment.depth),
            fragment.query
        );
    }
}
