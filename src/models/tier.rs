//! Model capacity tiers.
//!
//! Each tier names a pretrained MusicGen variant trading download size and
//! inference cost for output quality. The melody tier is the
//! melody-conditioned medium checkpoint; batch generation drives it with
//! text only.

use clap::ValueEnum;

/// Available MusicGen capacity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Tier {
    /// ~300M parameter decoder. Fastest, default.
    #[default]
    Small,
    /// ~1.5B parameter decoder.
    Medium,
    /// Melody-conditioned ~1.5B decoder.
    Melody,
    /// ~3.3B parameter decoder. Slowest, best quality.
    Large,
}

impl Tier {
    /// Returns the string representation of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Melody => "melody",
            Tier::Large => "large",
        }
    }

    /// Remote subdirectory holding the fp16 ONNX weight exports.
    pub fn weights_subdir(&self) -> &'static str {
        match self {
            Tier::Small => "small_fp16",
            Tier::Medium => "medium_fp16",
            Tier::Melody => "melody_fp16",
            Tier::Large => "large_fp16",
        }
    }

    /// Remote subdirectory holding the precision-independent files
    /// (tokenizer and config).
    pub fn config_subdir(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_strings() {
        assert_eq!(Tier::Small.as_str(), "small");
        assert_eq!(Tier::Medium.as_str(), "medium");
        assert_eq!(Tier::Melody.as_str(), "melody");
        assert_eq!(Tier::Large.as_str(), "large");
    }

    #[test]
    fn weights_subdir_is_fp16_variant() {
        for tier in [Tier::Small, Tier::Medium, Tier::Melody, Tier::Large] {
            assert_eq!(tier.weights_subdir(), format!("{}_fp16", tier.as_str()));
        }
    }

    #[test]
    fn default_tier_is_small() {
        assert_eq!(Tier::default(), Tier::Small);
    }
}
