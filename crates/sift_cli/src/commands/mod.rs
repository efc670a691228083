//! CLI command implementations.

pub mod classify;
pub mod fragments;
pub mod parse;
pub mod relocate;
pub mod substitute;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

/// Output format of every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// A query text could not be processed.
    #[error(transparent)]
    Query(#[from] sift_core::QueryError),

    /// JSON output failed.
    #[error("json output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Prints `value` as JSON, or runs `text` to print it for humans.
pub fn emit<T: Serialize>(
    value: &T,
    format: Format,
    text: impl FnOnce(&T),
) -> Result<(), CliError> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Text => text(value),
    }
    Ok(())
}
