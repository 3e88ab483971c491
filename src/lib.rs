//! musicgen-batch: batch text-to-music generation using MusicGen ONNX models.
//!
//! Reads a newline-delimited prompt file and writes one loudness-normalized
//! WAV file per prompt. The model itself runs inside ONNX Runtime; this
//! crate downloads and caches the pretrained exports, drives the
//! autoregressive generation loop, and persists the results.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface
//! - [`config`]: Device selection, runtime options, environment overrides
//! - [`models`]: Model acquisition and the three ONNX session wrappers
//! - [`generation`]: Per-prompt pipeline and the batch loop
//! - [`audio`]: WAV persistence with level normalization
//! - [`prompts`]: Prompt file ingestion and first-run bootstrap
//! - [`error`]: Code-tagged error type
//!
//! # Example
//!
//! ```rust,ignore
//! use musicgen_batch::config::{RuntimeOptions, Settings};
//! use musicgen_batch::models::{ensure_models, load_sessions, Tier};
//! use musicgen_batch::types::GenerationParams;
//!
//! let dir = musicgen_batch::config::default_model_dir(Tier::Small);
//! ensure_models(&dir, Tier::Small)?;
//! let mut models = load_sessions(&dir, Tier::Small, &RuntimeOptions::default())?;
//! models.set_generation_params(GenerationParams::new(10, 3.5));
//! let samples = musicgen_batch::generation::generate(&mut models, "calm piano")?;
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod prompts;
pub mod types;

// Re-export commonly used types at the crate root for convenience
pub use config::{Device, RuntimeOptions, Settings};
pub use error::{BatchError, ErrorCode, Result};
pub use models::Tier;
pub use types::{GenerationParams, ModelConfig};
