//! Core data types shared across the crate.

pub mod config;
pub mod params;

pub use config::ModelConfig;
pub use params::{GenerationParams, DEFAULT_DURATION_SEC, DEFAULT_GUIDANCE_SCALE, TOKENS_PER_SECOND};
