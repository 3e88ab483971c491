//! EnCodec audio decoder.
//!
//! Turns generated token frames into waveform samples via the exported
//! `encodec_decode.onnx` session.

use std::path::Path;

use ort::session::Session;
use ort::value::Tensor;

use crate::config::RuntimeOptions;
use crate::error::{BatchError, Result};

use super::decoder::CODEBOOKS;
use super::loader::load_session;
use super::logits::extract_f32;

/// EnCodec decode session.
pub struct AudioCodec {
    session: Session,
}

impl AudioCodec {
    /// Loads `encodec_decode.onnx` from the model directory.
    pub fn load(model_dir: &Path, runtime: &RuntimeOptions) -> Result<Self> {
        let session = load_session(&model_dir.join("encodec_decode.onnx"), runtime)?;
        Ok(Self { session })
    }

    /// Decodes token frames into mono f32 samples.
    pub fn decode(&mut self, frames: &[[i64; CODEBOOKS]]) -> Result<Vec<f32>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let codes = Tensor::from_array((
            [1usize, 1, CODEBOOKS, frames.len()],
            codebook_major(frames),
        ))
        .map_err(|e| BatchError::model_inference_failed(format!("code tensor: {}", e)))?;

        let mut outputs = self.session.run(ort::inputs![codes]).map_err(|e| {
            BatchError::model_inference_failed(format!("audio codec: {}", e))
        })?;

        let audio_values = outputs.remove("audio_values").ok_or_else(|| {
            BatchError::model_inference_failed("audio codec produced no audio_values")
        })?;

        let (_, samples) = extract_f32(&audio_values)?;
        Ok(samples)
    }
}

/// Flattens `[frame][codebook]` ids into codebook-major order, the layout
/// the codec expects for its `[1, 1, codebooks, seq]` input.
fn codebook_major(frames: &[[i64; CODEBOOKS]]) -> Vec<i64> {
    let seq = frames.len();
    let mut codes = vec![0i64; seq * CODEBOOKS];
    for (t, frame) in frames.iter().enumerate() {
        for (k, id) in frame.iter().enumerate() {
            codes[k * seq + t] = *id;
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codebook_major_transposes_frames() {
        let frames = [[1i64, 2, 3, 4], [5, 6, 7, 8]];
        assert_eq!(codebook_major(&frames), vec![1, 5, 2, 6, 3, 7, 4, 8]);
    }

    #[test]
    fn single_frame_is_identity_layout() {
        let frames = [[9i64, 8, 7, 6]];
        assert_eq!(codebook_major(&frames), vec![9, 8, 7, 6]);
    }
}
