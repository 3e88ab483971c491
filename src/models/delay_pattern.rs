//! Delay pattern bookkeeping for the multi-codebook decoder.
//!
//! MusicGen predicts its EnCodec codebooks in parallel but keeps them
//! causal by delaying codebook k by k steps:
//! ```text
//!   step    0 1 2 3 4 5 ...
//!   book 0  x x x x x x
//!   book 1  P x x x x x
//!   book 2  P P x x x x
//!   book 3  P P P x x x
//! ```
//! During generation the buffer answers two questions: which (possibly
//! padded) ids feed the next decoder step, and which aligned column of
//! real ids can be handed to the audio codec.

/// Rolling buffer of sampled ids for N codebooks.
#[derive(Debug, Default)]
pub struct DelayBuffer<const N: usize> {
    /// One entry per decoder step, each holding the id sampled for every
    /// codebook at that step.
    steps: Vec<[i64; N]>,
}

impl<const N: usize> DelayBuffer<N> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        assert!(N > 0, "delay buffer needs at least one codebook");
        Self { steps: Vec::new() }
    }

    /// Records the ids sampled at the current step, one per codebook.
    pub fn push(&mut self, ids: [i64; N]) {
        self.steps.push(ids);
    }

    /// Ids to feed the next decoder step, with the delay applied.
    ///
    /// Codebook k only starts emitting real ids once k steps have been
    /// recorded; before that it feeds the pad token.
    pub fn delayed_inputs(&self, pad_token_id: i64) -> [i64; N] {
        let mut out = [pad_token_id; N];
        if let Some(last) = self.steps.last() {
            for (k, slot) in out.iter_mut().enumerate() {
                if self.steps.len() > k {
                    *slot = last[k];
                }
            }
        }
        out
    }

    /// The newest fully-aligned column of ids across all codebooks, with
    /// the delay removed.
    ///
    /// Reads the anti-diagonal ending at the most recent step; None until
    /// N steps have accumulated.
    pub fn undelayed(&self) -> Option<[i64; N]> {
        let len = self.steps.len();
        if len < N {
            return None;
        }
        let mut out = [0i64; N];
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = self.steps[len - N + k][k];
        }
        Some(out)
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if no steps have been recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let buffer = DelayBuffer::<4>::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.delayed_inputs(0), [0, 0, 0, 0]);
    }

    #[test]
    fn delayed_inputs_pad_late_codebooks() {
        let mut buffer = DelayBuffer::<4>::new();
        buffer.push([1, 2, 3, 4]);
        assert_eq!(buffer.delayed_inputs(0), [1, 0, 0, 0]);
        buffer.push([5, 6, 7, 8]);
        assert_eq!(buffer.delayed_inputs(0), [5, 6, 0, 0]);
        buffer.push([9, 10, 11, 12]);
        assert_eq!(buffer.delayed_inputs(0), [9, 10, 11, 0]);
        buffer.push([13, 14, 15, 16]);
        assert_eq!(buffer.delayed_inputs(0), [13, 14, 15, 16]);
        buffer.push([17, 18, 19, 20]);
        assert_eq!(buffer.delayed_inputs(0), [17, 18, 19, 20]);
    }

    #[test]
    fn undelayed_reads_the_anti_diagonal() {
        let mut buffer = DelayBuffer::<4>::new();
        assert_eq!(buffer.undelayed(), None);
        buffer.push([1, 2, 3, 4]);
        buffer.push([5, 6, 7, 8]);
        buffer.push([9, 10, 11, 12]);
        assert_eq!(buffer.undelayed(), None);
        buffer.push([13, 14, 15, 16]);
        assert_eq!(buffer.undelayed(), Some([1, 6, 11, 16]));
        buffer.push([17, 18, 19, 20]);
        assert_eq!(buffer.undelayed(), Some([5, 10, 15, 20]));
    }

    #[test]
    fn len_tracks_pushes() {
        let mut buffer = DelayBuffer::<2>::new();
        buffer.push([1, 2]);
        buffer.push([3, 4]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.undelayed(), Some([1, 4]));
    }
}
