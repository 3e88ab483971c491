//! ModelConfig type for MusicGen architecture parameters.
//!
//! The values mirror the model's config.json and drive tensor shapes
//! during inference. Each capacity tier ships its own defaults for the
//! case where config.json is absent from the cache.

use serde::{Deserialize, Serialize};

use crate::models::Tier;

/// Configuration parameters for a MusicGen model variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Token vocabulary size per codebook (2048 for all MusicGen tiers).
    pub vocab_size: u32,

    /// Number of decoder transformer layers.
    pub num_hidden_layers: u32,

    /// Number of attention heads in each decoder layer.
    pub num_attention_heads: u32,

    /// Hidden dimension of the text encoder.
    pub d_model: u32,

    /// Key/value dimension per attention head.
    pub d_kv: u32,

    /// Audio sample rate in Hz (32000 for all MusicGen tiers).
    pub sample_rate: u32,

    /// Number of EnCodec codebooks (4 for all MusicGen tiers).
    pub codebooks: u32,

    /// Padding token ID for the decoder.
    pub pad_token_id: i64,
}

impl ModelConfig {
    /// Returns the architecture defaults for a capacity tier.
    ///
    /// Used when the model directory carries no config.json. The numbers
    /// follow the published MusicGen checkpoints; melody shares the
    /// medium-scale decoder.
    pub fn for_tier(tier: Tier) -> Self {
        let (num_hidden_layers, num_attention_heads, d_model) = match tier {
            Tier::Small => (24, 16, 1024),
            Tier::Medium | Tier::Melody => (48, 24, 1536),
            Tier::Large => (48, 32, 2048),
        };
        Self {
            vocab_size: 2048,
            num_hidden_layers,
            num_attention_heads,
            d_model,
            d_kv: d_model / num_attention_heads,
            sample_rate: 32000,
            codebooks: 4,
            pad_token_id: 2048, // vocab_size doubles as the pad token
        }
    }

    /// Validates the configuration for consistency.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.vocab_size == 0 {
            return Some("vocab_size must be > 0".to_string());
        }

        if self.num_hidden_layers == 0 {
            return Some("num_hidden_layers must be > 0".to_string());
        }

        if self.num_attention_heads == 0 {
            return Some("num_attention_heads must be > 0".to_string());
        }

        if self.d_model == 0 {
            return Some("d_model must be > 0".to_string());
        }

        let expected_d_kv = self.d_model / self.num_attention_heads;
        if self.d_kv != expected_d_kv {
            return Some(format!(
                "d_kv ({}) should be d_model / num_attention_heads ({})",
                self.d_kv, expected_d_kv
            ));
        }

        if self.sample_rate != 32000 {
            return Some(format!("sample_rate must be 32000, got {}", self.sample_rate));
        }

        // The delay pattern and the CFG batch layout both assume 4 codebooks.
        if self.codebooks != 4 {
            return Some(format!("codebooks must be 4, got {}", self.codebooks));
        }

        None
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_tier(Tier::Small)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_tier_defaults() {
        let config = ModelConfig::for_tier(Tier::Small);
        assert_eq!(config.vocab_size, 2048);
        assert_eq!(config.num_hidden_layers, 24);
        assert_eq!(config.num_attention_heads, 16);
        assert_eq!(config.d_model, 1024);
        assert_eq!(config.d_kv, 64);
        assert_eq!(config.sample_rate, 32000);
        assert!(config.validate().is_none());
    }

    #[test]
    fn all_tiers_validate() {
        for tier in [Tier::Small, Tier::Medium, Tier::Melody, Tier::Large] {
            let config = ModelConfig::for_tier(tier);
            assert!(config.validate().is_none(), "tier {tier:?} failed validation");
        }
    }

    #[test]
    fn melody_shares_medium_decoder() {
        let melody = ModelConfig::for_tier(Tier::Melody);
        let medium = ModelConfig::for_tier(Tier::Medium);
        assert_eq!(melody.num_hidden_layers, medium.num_hidden_layers);
        assert_eq!(melody.d_model, medium.d_model);
    }

    #[test]
    fn validation_rejects_inconsistent_d_kv() {
        let mut config = ModelConfig::for_tier(Tier::Small);
        config.d_kv = 128;
        assert!(config.validate().is_some());
    }
}
