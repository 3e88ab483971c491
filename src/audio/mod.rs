//! Audio persistence.

pub mod wav;

pub use wav::{normalize, samples_to_duration, write_wav, Normalization, CHANNELS};
