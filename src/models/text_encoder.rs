//! Text encoder for prompt conditioning.
//!
//! Tokenizes the prompt and runs the T5 encoder session to produce the
//! hidden states the decoder attends over.

use std::path::Path;

use ort::value::{DynValue, Tensor};
use tokenizers::Tokenizer;

use crate::config::RuntimeOptions;
use crate::error::{BatchError, Result};

use super::loader::load_session;

/// Tokenizer plus T5 encoder session.
pub struct TextEncoder {
    tokenizer: Tokenizer,
    session: ort::session::Session,
}

impl TextEncoder {
    /// Loads `tokenizer.json` and `text_encoder.onnx` from the model
    /// directory.
    pub fn load(model_dir: &Path, runtime: &RuntimeOptions) -> Result<Self> {
        let mut tokenizer =
            Tokenizer::from_file(model_dir.join("tokenizer.json")).map_err(|e| {
                BatchError::model_load_failed(format!("tokenizer.json: {}", e))
            })?;

        tokenizer.with_padding(None).with_truncation(None).map_err(|e| {
            BatchError::model_load_failed(format!("tokenizer configuration: {}", e))
        })?;

        let session = load_session(&model_dir.join("text_encoder.onnx"), runtime)?;

        Ok(Self { tokenizer, session })
    }

    /// Encodes a prompt into `(last_hidden_state, attention_mask)`.
    ///
    /// The attention mask returned here is the one the decoder sessions
    /// expect as `encoder_attention_mask`.
    pub fn encode(&mut self, prompt: &str) -> Result<(DynValue, DynValue)> {
        let ids: Vec<i64> = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| {
                BatchError::model_inference_failed(format!("tokenization: {}", e))
            })?
            .get_ids()
            .iter()
            .map(|id| *id as i64)
            .collect();
        let len = ids.len();

        let input_ids = Tensor::from_array(([1, len], ids)).map_err(|e| {
            BatchError::model_inference_failed(format!("input_ids tensor: {}", e))
        })?;
        let attention_mask =
            Tensor::from_array(([1, len], vec![1i64; len])).map_err(|e| {
                BatchError::model_inference_failed(format!("attention_mask tensor: {}", e))
            })?;

        let mut outputs = self
            .session
            .run(ort::inputs![input_ids, attention_mask])
            .map_err(|e| {
                BatchError::model_inference_failed(format!("text encoder: {}", e))
            })?;

        let last_hidden_state = outputs.remove("last_hidden_state").ok_or_else(|| {
            BatchError::model_inference_failed("text encoder produced no last_hidden_state")
        })?;

        // The run above consumed the mask tensor; rebuild it for the decoder.
        let decoder_mask =
            Tensor::from_array(([1, len], vec![1i64; len])).map_err(|e| {
                BatchError::model_inference_failed(format!("attention_mask tensor: {}", e))
            })?;

        Ok((last_hidden_state, decoder_mask.into_dyn()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_model_dir;
    use crate::models::Tier;

    fn cached_model_dir() -> Option<std::path::PathBuf> {
        let dir = default_model_dir(Tier::Small);
        dir.join("tokenizer.json").exists().then_some(dir)
    }

    #[test]
    fn encoder_loads_and_encodes_when_models_cached() {
        let Some(model_dir) = cached_model_dir() else {
            eprintln!("Skipping test: models not downloaded");
            return;
        };

        let mut encoder = TextEncoder::load(&model_dir, &RuntimeOptions::default()).unwrap();
        let (hidden, mask) = encoder.encode("upbeat electronic dance music").unwrap();
        assert!(
            hidden.try_extract_tensor::<f32>().is_ok()
                || hidden.try_extract_tensor::<half::f16>().is_ok()
        );
        assert!(mask.try_extract_tensor::<i64>().is_ok());
    }
}
