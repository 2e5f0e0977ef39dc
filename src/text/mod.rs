//! Text transforms
//!
//! [`process_file`] backs the `transform-text` binary: validate the input,
//! upper-case it, then write it out or echo it. [`DataProcessor`] and
//! [`process_data`] are the reusable per-string building blocks.

mod processor;

pub use processor::{DataProcessor, ProcessorConfig};

use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Upper-case the contents of `input`.
///
/// The result goes to `output` when given, otherwise it is echoed to `echo`
/// followed by a newline. Content is transformed verbatim (no trimming).
///
/// # Errors
/// - [`Error::NotFound`] if `input` does not exist
/// - [`Error::Validation`] if the file holds only whitespace
/// - IO errors from reading or writing
pub fn process_file<W: Write + ?Sized>(
    input: &Path,
    output: Option<&Path>,
    echo: &mut W,
) -> Result<()> {
    if input.as_os_str().is_empty() {
        return Err(Error::validation("input_path must be a non-empty string"));
    }
    if !input.exists() {
        return Err(Error::not_found(format!(
            "Input file not found: {}",
            input.display()
        )));
    }

    debug!("Processing file: {}", input.display());
    let content = fs::read_to_string(input)?;
    if content.trim().is_empty() {
        return Err(Error::validation("Input file is empty"));
    }

    let processed = content.to_uppercase();

    match output {
        Some(path) => {
            fs::write(path, &processed)?;
            debug!("Output written to: {}", path.display());
        }
        None => writeln!(echo, "{processed}")?,
    }
    Ok(())
}

/// Trim and lower-case each item, optionally dropping items that end up empty
///
/// # Errors
/// Returns [`Error::Validation`] if `items` is empty
pub fn process_data<S: AsRef<str>>(items: &[S], filter_empty: bool) -> Result<Vec<String>> {
    if items.is_empty() {
        return Err(Error::validation("input_data cannot be empty"));
    }

    Ok(items
        .iter()
        .map(|item| item.as_ref().trim().to_lowercase())
        .filter(|item| !(filter_empty && item.is_empty()))
        .collect())
}
