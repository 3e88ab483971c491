//! The batch loop: one prompt in, one track out, strictly in order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::{write_wav, Normalization};
use crate::error::{BatchError, Result};
use crate::models::MusicGenModels;

use super::pipeline;

/// Longest prompt prefix carried into a track filename.
pub const STEM_PROMPT_CHARS: usize = 30;

/// Derives the output filename stem for a prompt.
///
/// `track_{index:02}_{prefix}` where the prefix is the first
/// [`STEM_PROMPT_CHARS`] characters of the prompt with spaces replaced by
/// underscores and forward slashes by hyphens. The index is 1-based. The
/// extension is appended later by the WAV writer.
pub fn track_stem(index: usize, prompt: &str) -> String {
    let prefix: String = prompt
        .chars()
        .take(STEM_PROMPT_CHARS)
        .map(|c| match c {
            ' ' => '_',
            '/' => '-',
            c => c,
        })
        .collect();
    format!("track_{index:02}_{prefix}")
}

/// Creates the output directory if absent.
///
/// Recursive and idempotent; pre-existing contents are left untouched.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        BatchError::output_dir_failed(format!("{}: {}", path.display(), e))
    })
}

/// Generates one track per prompt, in file order.
///
/// Sequential by design: one model invocation in flight at a time, no
/// retry, no skipping. The first failure aborts the whole run; earlier
/// tracks stay on disk.
///
/// Returns the paths of the written files, one per prompt.
pub fn run_batch(
    models: &mut MusicGenModels,
    prompts: &[String],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let total = prompts.len();
    eprintln!();
    eprintln!("Generating {} tracks...", total);
    eprintln!();

    let mut written = Vec::with_capacity(total);
    for (i, prompt) in prompts.iter().enumerate() {
        let index = i + 1;
        eprintln!("[{}/{}] Generating: '{}'", index, total, prompt);

        let samples = pipeline::generate(models, prompt)?;

        let stem = output_dir.join(track_stem(index, prompt));
        let path = write_wav(&stem, &samples, models.sample_rate(), Normalization::Loudness)?;
        eprintln!("Saved: {}", path.display());
        eprintln!();
        written.push(path);
    }

    eprintln!();
    eprintln!(
        "Batch complete! Generated {} tracks in '{}'",
        total,
        output_dir.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stem_truncates_then_substitutes() {
        // 26 letters + space + "ABC" fill the 30-character window.
        assert_eq!(
            track_stem(1, "abcdefghijklmnopqrstuvwxyz ABCD efgh"),
            "track_01_abcdefghijklmnopqrstuvwxyz_ABC"
        );
    }

    #[test]
    fn stem_replaces_spaces_and_slashes() {
        assert_eq!(track_stem(3, "jazz/blues duo"), "track_03_jazz-blues_duo");
    }

    #[test]
    fn stem_keeps_short_prompts_whole() {
        assert_eq!(track_stem(12, "calm piano"), "track_12_calm_piano");
    }

    #[test]
    fn stem_index_is_zero_padded() {
        assert_eq!(track_stem(7, "x"), "track_07_x");
        assert_eq!(track_stem(42, "x"), "track_42_x");
    }

    #[test]
    fn stem_truncation_is_character_based() {
        // Multi-byte characters count as one each; no mid-char splits.
        let prompt = "ééééééééééééééééééééééééééééééééé"; // 33 chars
        let stem = track_stem(1, prompt);
        assert_eq!(stem.chars().count(), "track_01_".len() + 30);
    }

    #[test]
    fn output_dir_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("output");

        ensure_output_dir(&out).unwrap();
        assert!(out.is_dir());

        // A second run must neither fail nor disturb existing files.
        let unrelated = out.join("keep.txt");
        fs::write(&unrelated, "precious").unwrap();
        ensure_output_dir(&out).unwrap();
        assert_eq!(fs::read_to_string(&unrelated).unwrap(), "precious");
    }

    #[test]
    fn output_dir_creates_nested_paths() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("a").join("b").join("c");
        ensure_output_dir(&out).unwrap();
        assert!(out.is_dir());
    }
}
