//! Audio generation.

pub mod batch;
pub mod pipeline;

pub use batch::{ensure_output_dir, run_batch, track_stem};
pub use pipeline::generate;
