//! Autoregressive token decoder.
//!
//! Drives the split decoder export: a first-pass session that builds the
//! KV cache from scratch and a with-past session for every later step.
//! The batch dimension carries the conditional and unconditional halves of
//! the classifier-free-guidance pair, four codebook rows each.

use std::borrow::Cow;
use std::path::Path;

use half::f16;
use ort::session::{Session, SessionInputValue};
use ort::value::{DynValue, Tensor};

use crate::config::RuntimeOptions;
use crate::error::{BatchError, Result};
use crate::types::{GenerationParams, ModelConfig};

use super::delay_pattern::DelayBuffer;
use super::loader::load_session;
use super::logits::Logits;

/// Codebooks predicted per step. The delay pattern, the CFG batch layout,
/// and the codec input shape all assume this value.
pub const CODEBOOKS: usize = 4;

/// Split decoder sessions plus the architecture config.
pub struct Decoder {
    first_pass: Session,
    with_past: Session,
    config: ModelConfig,
}

impl Decoder {
    /// Loads `decoder_model.onnx` and `decoder_with_past_model.onnx` from
    /// the model directory.
    pub fn load(model_dir: &Path, config: ModelConfig, runtime: &RuntimeOptions) -> Result<Self> {
        let first_pass = load_session(&model_dir.join("decoder_model.onnx"), runtime)?;
        let with_past = load_session(&model_dir.join("decoder_with_past_model.onnx"), runtime)?;

        Ok(Self {
            first_pass,
            with_past,
            config,
        })
    }

    /// Generates token frames for one prompt.
    ///
    /// Returns `params.max_tokens()` frames of [`CODEBOOKS`] ids each
    /// (the delay pattern costs `CODEBOOKS - 1` extra decoder steps, which
    /// are run here and folded away).
    pub fn generate_tokens(
        &mut self,
        encoder_hidden_states: DynValue,
        encoder_attention_mask: DynValue,
        params: &GenerationParams,
    ) -> Result<Vec<[i64; CODEBOOKS]>> {
        let steps = params.max_tokens() + CODEBOOKS - 1;
        let layers = self.config.num_hidden_layers as usize;
        let pad = self.config.pad_token_id;
        // Conditional rows first, unconditional (zeroed-context) rows after.
        let batch = 2 * CODEBOOKS;

        let hidden = pair_with_zeros(&encoder_hidden_states)?;
        let mask = pair_with_zeros_i64(&encoder_attention_mask)?;

        let input_ids = id_tensor(&[pad; CODEBOOKS], batch)?;
        let first_inputs: Vec<(Cow<str>, SessionInputValue)> = vec![
            ("encoder_attention_mask".into(), SessionInputValue::from(mask.view())),
            ("encoder_hidden_states".into(), SessionInputValue::from(hidden.view())),
            ("input_ids".into(), SessionInputValue::from(input_ids.view())),
        ];

        let mut outputs = self.first_pass.run(first_inputs).map_err(|e| {
            BatchError::model_inference_failed(format!("decoder first pass: {}", e))
        })?;

        let mut buffer = DelayBuffer::<CODEBOOKS>::new();
        sample_step(&mut outputs, params, &mut buffer)?;
        let mut cache = KvCache::from_first_pass(&mut outputs, layers)?;

        let mut frames = Vec::with_capacity(params.max_tokens());
        for _ in 0..steps {
            let input_ids = id_tensor(&buffer.delayed_inputs(pad), batch)?;

            let mut step_inputs: Vec<(Cow<str>, SessionInputValue)> = vec![
                ("input_ids".into(), SessionInputValue::from(input_ids.view())),
                ("encoder_attention_mask".into(), SessionInputValue::from(mask.view())),
            ];
            for (name, value) in &cache.entries {
                step_inputs.push((Cow::from(name.as_str()), SessionInputValue::from(value.view())));
            }

            let mut outputs = self.with_past.run(step_inputs).map_err(|e| {
                BatchError::model_inference_failed(format!("decoder step: {}", e))
            })?;

            sample_step(&mut outputs, params, &mut buffer)?;
            if let Some(frame) = buffer.undelayed() {
                frames.push(frame);
            }
            cache.refresh(&mut outputs, layers)?;
        }

        // The delay compensation overshoots by one aligned frame.
        frames.truncate(params.max_tokens());
        Ok(frames)
    }
}

/// Samples the next per-codebook ids from a step's outputs into the buffer.
fn sample_step(
    outputs: &mut ort::session::SessionOutputs,
    params: &GenerationParams,
    buffer: &mut DelayBuffer<CODEBOOKS>,
) -> Result<()> {
    let logits_value = outputs
        .remove("logits")
        .ok_or_else(|| BatchError::model_inference_failed("decoder produced no logits"))?;

    let ids = Logits::from_3d_dyn_value(&logits_value)?
        .guided(params.guidance_scale)
        .sample(params.temperature, params.top_k, params.top_p);

    let mut frame = [0i64; CODEBOOKS];
    if ids.len() != CODEBOOKS {
        return Err(BatchError::model_inference_failed(format!(
            "expected {} sampled ids, got {}",
            CODEBOOKS,
            ids.len()
        )));
    }
    frame.copy_from_slice(&ids);
    buffer.push(frame);
    Ok(())
}

/// Builds the `[batch, 1]` input_ids tensor: the delayed ids repeated for
/// the conditional and unconditional halves.
fn id_tensor(ids: &[i64; CODEBOOKS], batch: usize) -> Result<Tensor<i64>> {
    let mut data = Vec::with_capacity(batch);
    data.extend_from_slice(ids);
    data.extend_from_slice(ids);
    Tensor::from_array(([batch, 1], data)).map_err(|e| {
        BatchError::model_inference_failed(format!("input_ids tensor: {}", e))
    })
}

/// Named past_key_values inputs carried between decoder steps.
struct KvCache {
    entries: Vec<(String, DynValue)>,
}

impl KvCache {
    /// Captures decoder and encoder keys/values from the first pass.
    fn from_first_pass(outputs: &mut ort::session::SessionOutputs, layers: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(layers * 4);
        for layer in 0..layers {
            for kind in ["decoder.key", "decoder.value", "encoder.key", "encoder.value"] {
                let value = take_present(outputs, layer, kind)?;
                entries.push((format!("past_key_values.{layer}.{kind}"), value));
            }
        }
        Ok(Self { entries })
    }

    /// Replaces the decoder keys/values with this step's outputs. The
    /// encoder entries never change after the first pass.
    fn refresh(&mut self, outputs: &mut ort::session::SessionOutputs, layers: usize) -> Result<()> {
        for layer in 0..layers {
            for (offset, kind) in ["decoder.key", "decoder.value"].into_iter().enumerate() {
                let value = take_present(outputs, layer, kind)?;
                self.entries[layer * 4 + offset] =
                    (format!("past_key_values.{layer}.{kind}"), value);
            }
        }
        Ok(())
    }
}

fn take_present(
    outputs: &mut ort::session::SessionOutputs,
    layer: usize,
    kind: &str,
) -> Result<DynValue> {
    outputs.remove(&format!("present.{layer}.{kind}")).ok_or_else(|| {
        BatchError::model_inference_failed(format!("present.{layer}.{kind} missing from outputs"))
    })
}

/// Doubles a tensor along the batch axis, zero-filling the second half.
///
/// The zeroed half is the unconditional context for classifier-free
/// guidance. Handles f16 and f32 exports.
fn pair_with_zeros(tensor: &DynValue) -> Result<DynValue> {
    if let Ok(result) = pair_with_zeros_typed::<f16>(tensor) {
        return Ok(result);
    }
    pair_with_zeros_typed::<f32>(tensor)
}

fn pair_with_zeros_typed<T>(tensor: &DynValue) -> Result<DynValue>
where
    T: ort::value::PrimitiveTensorElementType + Clone + Default + std::fmt::Debug + 'static,
{
    let (shape, data) = tensor.try_extract_tensor::<T>().map_err(|e| {
        BatchError::model_inference_failed(format!("tensor extraction: {}", e))
    })?;

    let mut doubled_shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    doubled_shape[0] *= 2;

    let mut doubled = data.to_vec();
    doubled.resize(data.len() * 2, T::default());

    let result = Tensor::from_array((doubled_shape, doubled)).map_err(|e| {
        BatchError::model_inference_failed(format!("tensor duplication: {}", e))
    })?;
    Ok(result.into_dyn())
}

fn pair_with_zeros_i64(tensor: &DynValue) -> Result<DynValue> {
    pair_with_zeros_typed::<i64>(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_tensor_repeats_for_both_halves() {
        let tensor = id_tensor(&[1, 2, 3, 4], 8).unwrap();
        let (shape, data) = tensor.try_extract_tensor::<i64>().unwrap();
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        assert_eq!(dims, vec![8, 1]);
        assert_eq!(data.to_vec(), vec![1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn step_budget_covers_delay_compensation() {
        let params = GenerationParams::new(1, 3.5);
        // 50 frames per second plus 3 delay steps.
        assert_eq!(params.max_tokens() + CODEBOOKS - 1, 53);
    }
}
