//! Logits processing for the decoder output.
//!
//! Handles classifier-free guidance and temperature / top-k / top-p
//! sampling of the per-codebook token distributions.

use std::fmt::{Debug, Formatter};
use std::ops::Deref;

use half::f16;
use ndarray::{s, Array, Array2, Axis, Ix3, IxDyn};
use ort::util::ArrayExt;
use ort::value::DynValue;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::thread_rng;

use crate::error::{BatchError, Result};

/// One step of decoder logits, one row per batch entry (codebook).
pub struct Logits(Array2<f32>);

impl Deref for Logits {
    type Target = Array2<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for Logits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Logits({:?})", self.0.dim())
    }
}

impl Logits {
    /// Builds Logits from a `[batch, seq, vocab]` tensor value.
    ///
    /// The decoder emits one step at a time, so the sequence axis is
    /// always length 1 and gets removed. Accepts f32 or f16 tensors.
    pub fn from_3d_dyn_value(value: &DynValue) -> Result<Self> {
        let (shape, data) = extract_f32(value)?;

        let arr = Array::from_shape_vec(IxDyn(&shape), data).map_err(|e| {
            BatchError::model_inference_failed(format!("bad logits shape: {}", e))
        })?;
        let arr = arr.into_dimensionality::<Ix3>().map_err(|e| {
            BatchError::model_inference_failed(format!("expected 3D logits: {}", e))
        })?;

        Ok(Self(arr.remove_axis(Axis(1))))
    }

    /// Combines the conditional and unconditional halves of the batch into
    /// guided logits: `uncond + (cond - uncond) * scale`.
    ///
    /// # Panics
    ///
    /// Panics if the batch dimension is odd; the decoder always runs the
    /// conditional and unconditional passes as pairs.
    pub fn guided(self, guidance_scale: f32) -> Self {
        let batch = self.0.dim().0;
        assert!(
            batch % 2 == 0,
            "guidance needs a paired conditional/unconditional batch"
        );

        let half = batch / 2;
        let cond = self.0.slice(s![..half, ..]);
        let uncond = self.0.slice(s![half.., ..]);

        Self((cond.into_owned() - uncond) * guidance_scale + uncond)
    }

    /// Samples one token id per batch row.
    ///
    /// Temperature rescales the logits before softmax; a non-positive
    /// temperature degenerates to argmax. With `top_p > 0` the nucleus
    /// (smallest prefix of probability mass >= top_p) is sampled,
    /// otherwise the `top_k` most probable ids are.
    pub fn sample(&self, temperature: f32, top_k: usize, top_p: f32) -> Vec<i64> {
        if temperature <= 0.0 {
            return self.argmax();
        }

        let scaled = if temperature == 1.0 {
            self.0.clone()
        } else {
            &self.0 / temperature
        };
        let probs = scaled.softmax(Axis(1));

        let mut sampled = Vec::with_capacity(probs.dim().0);
        for row in probs.axis_iter(Axis(0)) {
            let mut candidates: Vec<(i64, f32)> = row
                .iter()
                .enumerate()
                .map(|(id, p)| (id as i64, *p))
                .collect();
            candidates.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .expect("token probabilities must be comparable")
            });

            let cutoff = if top_p > 0.0 {
                nucleus_len(&candidates, top_p)
            } else {
                top_k.min(candidates.len())
            };
            candidates.truncate(cutoff.max(1));

            let distribution = WeightedIndex::new(candidates.iter().map(|(_, p)| *p))
                .expect("truncated probabilities must form a distribution");
            let (id, _) = candidates[distribution.sample(&mut thread_rng())];
            sampled.push(id);
        }
        sampled
    }

    /// Most probable id per batch row.
    fn argmax(&self) -> Vec<i64> {
        self.0
            .axis_iter(Axis(0))
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| {
                        a.1.partial_cmp(b.1).expect("logits must be comparable")
                    })
                    .map(|(id, _)| id as i64)
                    .expect("logits row must be non-empty")
            })
            .collect()
    }
}

/// Number of sorted candidates inside the top-p nucleus.
fn nucleus_len(sorted: &[(i64, f32)], top_p: f32) -> usize {
    let mut mass = 0.0f32;
    for (i, (_, p)) in sorted.iter().enumerate() {
        mass += p;
        if mass >= top_p {
            return i + 1;
        }
    }
    sorted.len()
}

/// Extracts a tensor value as f32 data, converting from f16 if needed.
pub(crate) fn extract_f32(value: &DynValue) -> Result<(Vec<usize>, Vec<f32>)> {
    if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        return Ok((shape, data.to_vec()));
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<f16>() {
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        return Ok((shape, data.iter().map(|v| f32::from(*v)).collect()));
    }
    Err(BatchError::model_inference_failed(
        "tensor must be f32 or f16",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn logits_2x3(values: Vec<f32>) -> Logits {
        Logits(Array::from_shape_vec((2, 3), values).unwrap())
    }

    #[test]
    fn guidance_combines_halves() {
        let logits = logits_2x3(vec![10., -1., 3., -1., 1., 11.]);
        let guided = logits.guided(3.0);
        assert_eq!(guided.shape(), &[1, 3]);
        // uncond + (cond - uncond) * 3
        assert_eq!(guided.0[[0, 0]], -1.0 + (10.0 - -1.0) * 3.0);
        assert_eq!(guided.0[[0, 2]], 11.0 + (3.0 - 11.0) * 3.0);
    }

    #[test]
    fn guidance_scale_is_fractional() {
        let logits = logits_2x3(vec![4., 0., 0., 0., 0., 0.]);
        let guided = logits.guided(3.5);
        assert_eq!(guided.0[[0, 0]], 14.0);
    }

    #[test]
    fn sampled_ids_stay_in_vocab() {
        let logits = logits_2x3(vec![0.1, 0.2, 0.7, 0.3, 0.4, 0.3]);
        let ids = logits.sample(1.0, 2, 0.0);
        assert_eq!(ids.len(), 2);
        for id in ids {
            assert!((0..3).contains(&id));
        }
    }

    #[test]
    fn zero_temperature_is_argmax() {
        let logits = logits_2x3(vec![0.1, 5.0, 0.7, 9.0, 0.4, 0.3]);
        assert_eq!(logits.sample(0.0, 250, 0.0), vec![1, 0]);
    }

    #[test]
    fn top_k_one_is_greedy() {
        let logits = logits_2x3(vec![0.1, 5.0, 0.7, 0.3, 0.4, 8.0]);
        assert_eq!(logits.sample(1.0, 1, 0.0), vec![1, 2]);
    }

    #[test]
    fn nucleus_covers_requested_mass() {
        let sorted = vec![(0i64, 0.5f32), (1, 0.3), (2, 0.15), (3, 0.05)];
        assert_eq!(nucleus_len(&sorted, 0.5), 1);
        assert_eq!(nucleus_len(&sorted, 0.75), 2);
        assert_eq!(nucleus_len(&sorted, 0.99), 4);
    }

    #[test]
    fn tiny_nucleus_still_keeps_one_candidate() {
        let logits = logits_2x3(vec![0.0, 10.0, 0.0, 10.0, 0.0, 0.0]);
        let ids = logits.sample(1.0, 250, 0.0001);
        assert_eq!(ids, vec![1, 0]);
    }
}
