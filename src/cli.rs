//! Command-line interface for batch generation.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{default_model_dir, Settings};
use crate::models::Tier;

/// Generate music from text descriptions using MusicGen
#[derive(Parser, Debug)]
#[command(name = "musicgen-batch")]
#[command(about = "Batch text-to-music generation using MusicGen ONNX models")]
#[command(version)]
pub struct Cli {
    /// Path to prompts file, one prompt per line
    #[arg(short, long, default_value = "prompts.txt")]
    pub prompts: PathBuf,

    /// Output directory for generated tracks
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Model capacity tier
    #[arg(short, long, value_enum, default_value_t = Tier::Small)]
    pub model: Tier,

    /// Duration of generated audio per prompt, in seconds
    #[arg(short, long, default_value_t = 30)]
    pub duration: u32,

    /// Guidance scale for prompt adherence
    #[arg(short, long, default_value_t = 3.5)]
    pub guidance: f32,

    /// Directory containing ONNX model files (defaults to the platform cache)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns the effective model directory.
    ///
    /// Precedence: `--model-dir` flag, then the `MUSICGEN_BATCH_MODEL_DIR`
    /// environment override, then the platform cache for the tier.
    pub fn model_directory(&self, settings: &Settings) -> PathBuf {
        self.model_dir
            .clone()
            .or_else(|| settings.model_dir.clone())
            .unwrap_or_else(|| default_model_dir(self.model))
    }
}
