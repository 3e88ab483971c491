//! Model loading.
//!
//! Builds the three ONNX sessions that make up a MusicGen variant and
//! bundles them with the architecture config and the per-run generation
//! parameters.

use std::path::Path;

use ort::session::Session;
use serde::Deserialize;

use crate::config::RuntimeOptions;
use crate::error::{BatchError, Result};
use crate::types::{GenerationParams, ModelConfig};

use super::audio_codec::AudioCodec;
use super::decoder::Decoder;
use super::text_encoder::TextEncoder;
use super::tier::Tier;

/// Files a model directory must contain before loading.
pub const REQUIRED_MODEL_FILES: &[&str] = &[
    "tokenizer.json",
    "text_encoder.onnx",
    "decoder_model.onnx",
    "decoder_with_past_model.onnx",
    "encodec_decode.onnx",
];

/// Base URL of the MusicGen ONNX exports.
pub const REMOTE_BASE: &str = "https://huggingface.co/gabotechs/music_gen/resolve/main";

/// Remote URL for one model file of a tier.
///
/// The tokenizer and config are shared between precision variants and
/// live in the tier's plain subdirectory; the ONNX graphs are the fp16
/// exports.
pub fn remote_url(tier: Tier, file: &str) -> String {
    let subdir = match file {
        "tokenizer.json" | "config.json" => tier.config_subdir(),
        _ => tier.weights_subdir(),
    };
    format!("{REMOTE_BASE}/{subdir}/{file}")
}

/// Checks that all required model files exist in the directory.
///
/// Returns an error listing the missing files otherwise.
pub fn check_models(model_dir: &Path) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_MODEL_FILES
        .iter()
        .copied()
        .filter(|file| !model_dir.join(file).exists())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BatchError::model_not_found(format!(
            "{} is missing {}",
            model_dir.display(),
            missing.join(", ")
        )))
    }
}

/// Builds one ONNX session with the shared runtime options applied.
pub(crate) fn load_session(path: &Path, runtime: &RuntimeOptions) -> Result<Session> {
    let mut builder = Session::builder().map_err(|e| {
        BatchError::model_load_failed(format!("session builder: {}", e))
    })?;

    if !runtime.providers.is_empty() {
        builder = builder
            .with_execution_providers(&runtime.providers)
            .map_err(|e| {
                BatchError::model_load_failed(format!("execution providers: {}", e))
            })?;
    }

    if let Some(threads) = runtime.intra_threads {
        builder = builder.with_intra_threads(threads as usize).map_err(|e| {
            BatchError::model_load_failed(format!("intra-op threads: {}", e))
        })?;
    }

    builder.commit_from_file(path).map_err(|e| {
        BatchError::model_load_failed(format!("{}: {}", path.display(), e))
    })
}

/// The loaded model: the three sessions, the architecture config, and the
/// generation parameters bound for this run.
pub struct MusicGenModels {
    pub text_encoder: TextEncoder,
    pub decoder: Decoder,
    pub audio_codec: AudioCodec,
    config: ModelConfig,
    tier: Tier,
    params: GenerationParams,
}

impl MusicGenModels {
    /// Binds the generation parameters for this run.
    ///
    /// Applied once after loading; every subsequent generation call uses
    /// these values.
    pub fn set_generation_params(&mut self, params: GenerationParams) {
        self.params = params;
    }

    /// The parameters bound for this run.
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Sample rate of generated audio, as reported by the model config.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// The loaded capacity tier.
    pub fn tier(&self) -> Tier {
        self.tier
    }
}

/// Loads all model components from a directory.
///
/// The directory must contain the [`REQUIRED_MODEL_FILES`]; `config.json`
/// is optional and falls back to the tier's architecture defaults.
pub fn load_sessions(
    model_dir: &Path,
    tier: Tier,
    runtime: &RuntimeOptions,
) -> Result<MusicGenModels> {
    check_models(model_dir)?;

    let config = read_config(model_dir, tier)?;
    if let Some(problem) = config.validate() {
        return Err(BatchError::model_load_failed(format!(
            "invalid model config: {problem}"
        )));
    }

    eprintln!("Loading text encoder...");
    let text_encoder = TextEncoder::load(model_dir, runtime)?;

    eprintln!("Loading decoder...");
    let decoder = Decoder::load(model_dir, config.clone(), runtime)?;

    eprintln!("Loading audio codec...");
    let audio_codec = AudioCodec::load(model_dir, runtime)?;

    Ok(MusicGenModels {
        text_encoder,
        decoder,
        audio_codec,
        config,
        tier,
        params: GenerationParams::default(),
    })
}

/// Slice of the HuggingFace config.json this crate cares about.
#[derive(Debug, Deserialize)]
struct RawConfig {
    decoder: RawDecoderConfig,
    text_encoder: Option<RawTextEncoderConfig>,
}

#[derive(Debug, Deserialize)]
struct RawDecoderConfig {
    num_hidden_layers: Option<u32>,
    num_attention_heads: Option<u32>,
    vocab_size: Option<u32>,
    pad_token_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTextEncoderConfig {
    d_model: Option<u32>,
    d_kv: Option<u32>,
}

/// Reads config.json if present, falling back to the tier defaults for
/// the file itself and for any field it omits.
fn read_config(model_dir: &Path, tier: Tier) -> Result<ModelConfig> {
    let path = model_dir.join("config.json");
    let defaults = ModelConfig::for_tier(tier);
    if !path.exists() {
        return Ok(defaults);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        BatchError::model_load_failed(format!("config.json: {}", e))
    })?;
    let raw: RawConfig = serde_json::from_str(&content).map_err(|e| {
        BatchError::model_load_failed(format!("config.json: {}", e))
    })?;

    let text_encoder = raw.text_encoder.as_ref();
    Ok(ModelConfig {
        vocab_size: raw.decoder.vocab_size.unwrap_or(defaults.vocab_size),
        num_hidden_layers: raw
            .decoder
            .num_hidden_layers
            .unwrap_or(defaults.num_hidden_layers),
        num_attention_heads: raw
            .decoder
            .num_attention_heads
            .unwrap_or(defaults.num_attention_heads),
        d_model: text_encoder
            .and_then(|te| te.d_model)
            .unwrap_or(defaults.d_model),
        d_kv: text_encoder.and_then(|te| te.d_kv).unwrap_or(defaults.d_kv),
        sample_rate: defaults.sample_rate,
        codebooks: defaults.codebooks,
        pad_token_id: raw.decoder.pad_token_id.unwrap_or(defaults.pad_token_id),
    })
}
