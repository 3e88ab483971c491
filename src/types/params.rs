//! Generation parameters bound to the model once per run.
//!
//! The prompt text is the only thing that varies between generation calls;
//! everything else is fixed here when the run starts.

/// Number of token frames the decoder produces per second of audio.
pub const TOKENS_PER_SECOND: usize = 50;

/// Sampling temperature. Fixed; not exposed on the command line.
pub const TEMPERATURE: f32 = 1.0;

/// Top-k cutoff for sampling. Fixed; not exposed on the command line.
pub const TOP_K: usize = 250;

/// Top-p (nucleus) cutoff for sampling. Zero disables nucleus sampling
/// in favor of the top-k path. Fixed; not exposed on the command line.
pub const TOP_P: f32 = 0.0;

/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f32 = 3.5;

/// Default duration of generated audio per prompt, in seconds.
pub const DEFAULT_DURATION_SEC: u32 = 30;

/// Parameters applied uniformly to every generation call in a run.
///
/// Constructed once from the CLI arguments and bound to the model with
/// [`set_generation_params`](crate::models::MusicGenModels::set_generation_params);
/// never revisited per prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Target duration of each generated clip, in seconds.
    pub duration_sec: u32,
    /// Classifier-free guidance scale. Higher values adhere more closely
    /// to the prompt.
    pub guidance_scale: f32,
    /// Sampling temperature, always [`TEMPERATURE`].
    pub temperature: f32,
    /// Top-k sampling cutoff, always [`TOP_K`].
    pub top_k: usize,
    /// Top-p sampling cutoff, always [`TOP_P`].
    pub top_p: f32,
}

impl GenerationParams {
    /// Creates parameters from the per-run settings.
    ///
    /// Duration and guidance come from the CLI unmodified; the sampling
    /// fields always take the fixed defaults.
    pub fn new(duration_sec: u32, guidance_scale: f32) -> Self {
        Self {
            duration_sec,
            guidance_scale,
            temperature: TEMPERATURE,
            top_k: TOP_K,
            top_p: TOP_P,
        }
    }

    /// Number of decoder token frames needed for the target duration.
    pub fn max_tokens(&self) -> usize {
        self.duration_sec as usize * TOKENS_PER_SECOND
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SEC, DEFAULT_GUIDANCE_SCALE)
    }
}
