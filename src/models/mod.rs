//! MusicGen model components.
//!
//! The pretrained model is consumed through three ONNX sessions:
//! - [`TextEncoder`](text_encoder::TextEncoder): prompt encoding
//! - [`Decoder`](decoder::Decoder): autoregressive token generation
//! - [`AudioCodec`](audio_codec::AudioCodec): token-to-waveform decoding
//!
//! plus the acquisition path ([`ensure_models`], [`load_sessions`]) that
//! downloads and caches the exports per capacity tier.

pub mod audio_codec;
pub mod decoder;
pub mod delay_pattern;
pub mod downloader;
pub mod loader;
pub mod logits;
pub mod text_encoder;
pub mod tier;

pub use audio_codec::AudioCodec;
pub use decoder::{Decoder, CODEBOOKS};
pub use delay_pattern::DelayBuffer;
pub use downloader::ensure_models;
pub use loader::{check_models, load_sessions, MusicGenModels, REQUIRED_MODEL_FILES};
pub use logits::Logits;
pub use text_encoder::TextEncoder;
pub use tier::Tier;
