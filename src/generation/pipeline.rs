//! Per-prompt generation.
//!
//! Runs one prompt through the loaded model: encode the text, generate
//! token frames under the bound parameters, decode to samples.

use crate::error::Result;
use crate::models::MusicGenModels;

/// Generates audio samples for a single prompt.
///
/// Uses the parameters previously bound with
/// [`set_generation_params`](MusicGenModels::set_generation_params).
/// Returns mono f32 samples at [`sample_rate`](MusicGenModels::sample_rate).
pub fn generate(models: &mut MusicGenModels, prompt: &str) -> Result<Vec<f32>> {
    let params = *models.params();

    let (hidden_states, attention_mask) = models.text_encoder.encode(prompt)?;

    let frames = models
        .decoder
        .generate_tokens(hidden_states, attention_mask, &params)?;

    models.audio_codec.decode(&frames)
}
