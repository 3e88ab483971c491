//! Prompt file ingestion.
//!
//! Prompts are newline-delimited UTF-8 text, one prompt per line. Blank
//! lines are skipped; surrounding whitespace is trimmed; source order is
//! preserved. A missing file is not an error: the driver bootstraps a
//! sample file and exits so the user can edit it.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{BatchError, Result};

/// Prompts written into a freshly bootstrapped file.
pub const SAMPLE_PROMPTS: &[&str] = &[
    "upbeat electronic dance music with synth leads",
    "calm acoustic guitar with gentle piano",
    "epic orchestral soundtrack with drums and strings",
];

/// Reads the prompt list from a file.
///
/// Lines are trimmed; empty lines are dropped. The returned order matches
/// the file order.
pub fn read_prompts(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        BatchError::prompts_unreadable(format!("{}: {}", path.display(), e))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Writes the sample prompt file for a first run.
pub fn write_sample_prompts(path: &Path) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|e| {
        BatchError::prompts_unreadable(format!("{}: {}", path.display(), e))
    })?;
    for prompt in SAMPLE_PROMPTS {
        writeln!(file, "{prompt}").map_err(|e| {
            BatchError::prompts_unreadable(format!("{}: {}", path.display(), e))
        })?;
    }
    Ok(())
}
