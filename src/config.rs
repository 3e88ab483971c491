//! Runtime configuration.
//!
//! Covers execution device selection, ONNX Runtime options, environment
//! overrides, and the platform cache location for model files.

use std::path::PathBuf;

use ort::execution_providers::{
    CUDA as CUDAExecutionProvider, CoreML as CoreMLExecutionProvider, ExecutionProvider,
    ExecutionProviderDispatch,
};

use crate::models::Tier;

/// Execution device for ONNX inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// Detect the best available device. Priority: CUDA > CoreML > CPU.
    #[default]
    Auto,

    /// Force CPU execution. Slowest but universally available.
    Cpu,

    /// NVIDIA GPU acceleration. Requires CUDA toolkit and a compatible GPU.
    Cuda,

    /// CoreML acceleration on Apple Silicon.
    Metal,
}

impl Device {
    /// Returns the string representation of the device.
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Metal => "metal",
        }
    }

    /// Parses a device from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Device::Auto),
            "cpu" => Some(Device::Cpu),
            "cuda" => Some(Device::Cuda),
            "metal" | "coreml" => Some(Device::Metal),
            _ => None,
        }
    }

    /// Resolves `Auto` against the execution providers actually available
    /// on this host.
    ///
    /// This is a capability query, not a fallible operation: an
    /// unavailable accelerator falls through to the next candidate
    /// without a warning.
    pub fn resolve(self) -> Device {
        match self {
            Device::Auto => {
                if CUDAExecutionProvider::default().is_available().unwrap_or(false) {
                    Device::Cuda
                } else if CoreMLExecutionProvider::default()
                    .is_available()
                    .unwrap_or(false)
                {
                    Device::Metal
                } else {
                    Device::Cpu
                }
            }
            other => other,
        }
    }

    /// Execution providers to register for this device.
    ///
    /// An empty list leaves ONNX Runtime on its default CPU provider.
    pub fn execution_providers(self) -> Vec<ExecutionProviderDispatch> {
        match self {
            Device::Cuda => vec![CUDAExecutionProvider::default().build()],
            Device::Metal => vec![CoreMLExecutionProvider::default().build()],
            // Unresolved Auto registers both; ONNX Runtime skips whichever
            // is unavailable at session build time.
            Device::Auto => vec![
                CUDAExecutionProvider::default().build(),
                CoreMLExecutionProvider::default().build(),
            ],
            Device::Cpu => Vec::new(),
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session construction options shared by all three model components.
#[derive(Default)]
pub struct RuntimeOptions {
    /// Execution providers to register, in preference order.
    pub providers: Vec<ExecutionProviderDispatch>,
    /// Intra-op thread count for the CPU provider. None uses the ONNX
    /// Runtime default.
    pub intra_threads: Option<u32>,
}

impl RuntimeOptions {
    /// Builds options for a resolved device.
    pub fn for_device(device: Device, intra_threads: Option<u32>) -> Self {
        Self {
            providers: device.execution_providers(),
            intra_threads,
        }
    }
}

/// Settings read from the environment at startup.
///
/// Environment variables:
/// - `MUSICGEN_BATCH_DEVICE` - device selection (auto, cpu, cuda, metal)
/// - `MUSICGEN_BATCH_MODEL_DIR` - model directory override
/// - `MUSICGEN_BATCH_THREADS` - intra-op thread count for CPU execution
///
/// Unset or unparseable variables fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Requested execution device.
    pub device: Device,
    /// Model directory override, below the CLI flag in precedence.
    pub model_dir: Option<PathBuf>,
    /// Intra-op thread count.
    pub threads: Option<u32>,
}

impl Settings {
    /// Reads settings from the environment.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(device_str) = std::env::var("MUSICGEN_BATCH_DEVICE") {
            if let Some(device) = Device::parse(&device_str) {
                settings.device = device;
            }
        }

        if let Ok(path) = std::env::var("MUSICGEN_BATCH_MODEL_DIR") {
            if !path.is_empty() {
                settings.model_dir = Some(PathBuf::from(path));
            }
        }

        if let Ok(threads_str) = std::env::var("MUSICGEN_BATCH_THREADS") {
            if let Ok(threads) = threads_str.parse::<u32>() {
                if threads > 0 {
                    settings.threads = Some(threads);
                }
            }
        }

        settings
    }
}

/// Returns the platform-specific default model storage path for a tier.
///
/// - macOS: `~/Library/Caches/musicgen-batch/<tier>`
/// - Linux: `~/.cache/musicgen-batch/<tier>`
/// - Windows: `C:\Users\<user>\AppData\Local\musicgen-batch\cache\<tier>`
pub fn default_model_dir(tier: Tier) -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "musicgen-batch") {
        proj_dirs.cache_dir().join(tier.as_str())
    } else {
        PathBuf::from("./models").join(tier.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parsing() {
        assert_eq!(Device::parse("auto"), Some(Device::Auto));
        assert_eq!(Device::parse("CPU"), Some(Device::Cpu));
        assert_eq!(Device::parse("cuda"), Some(Device::Cuda));
        assert_eq!(Device::parse("metal"), Some(Device::Metal));
        assert_eq!(Device::parse("coreml"), Some(Device::Metal));
        assert_eq!(Device::parse("tpu"), None);
    }

    #[test]
    fn device_display() {
        assert_eq!(Device::Auto.to_string(), "auto");
        assert_eq!(Device::Cuda.to_string(), "cuda");
    }

    #[test]
    fn explicit_devices_resolve_to_themselves() {
        assert_eq!(Device::Cpu.resolve(), Device::Cpu);
        assert_eq!(Device::Cuda.resolve(), Device::Cuda);
        assert_eq!(Device::Metal.resolve(), Device::Metal);
    }

    #[test]
    fn auto_resolves_to_concrete_device() {
        // Whatever the host offers, Auto must settle on something real.
        assert_ne!(Device::Auto.resolve(), Device::Auto);
    }

    #[test]
    fn cpu_registers_no_providers() {
        assert!(Device::Cpu.execution_providers().is_empty());
        assert!(!Device::Cuda.execution_providers().is_empty());
    }

    #[test]
    fn default_model_dir_is_tier_scoped() {
        let small = default_model_dir(Tier::Small);
        let large = default_model_dir(Tier::Large);
        assert!(small.to_string_lossy().ends_with("small"));
        assert!(large.to_string_lossy().ends_with("large"));
        assert_ne!(small, large);
    }

    #[test]
    fn settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.device, Device::Auto);
        assert!(settings.model_dir.is_none());
        assert!(settings.threads.is_none());
    }
}
