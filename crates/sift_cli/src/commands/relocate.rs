//! Relocate command implementation.

use super::{emit, Format};
use serde::Serialize;
use sift_core::legacy::{fix_multiline_comment, move_settings_to_the_end};
use tracing::debug;

/// Relocation output.
#[derive(Debug, Serialize)]
pub struct RelocateResult {
    /// The text as given.
    pub original: String,
    /// The text with settings keywords moved to the end.
    pub relocated: String,
}

/// Runs the relocate command.
pub fn run(text: &str, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Relocating settings of {:?}", text);
    let result = RelocateResult {
        original: text.to_string(),
        relocated: move_settings_to_the_end(&fix_multiline_comment(text)),
    };
    emit(&result, format, |result| println!("{}", result.relocated))?;
    Ok(())
}
