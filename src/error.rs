//! Error types for the batch generator.
//!
//! Defines the error codes and the error type used throughout the crate
//! for consistent reporting on the command line.

use std::fmt;

/// Error codes attached to every failure the batch driver can surface.
///
/// The missing-prompts-file case is deliberately absent: it is handled by
/// bootstrapping a sample file and is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// ONNX model files not found at the expected path.
    /// Trigger: model files missing from the cache directory.
    ModelNotFound,

    /// Failed to load an ONNX model into memory.
    /// Trigger: corrupt file, wrong format, or OOM during load.
    ModelLoadFailed,

    /// Failed to download model files from the remote source.
    /// Trigger: network error, disk full during download.
    ModelDownloadFailed,

    /// Model inference failed during generation.
    /// Trigger: numerical instability, OOM during generation.
    ModelInferenceFailed,

    /// Failed to write a generated track to disk.
    /// Trigger: disk full, permissions, invalid output path.
    AudioWriteFailed,

    /// Prompts file exists but could not be read as UTF-8 text.
    PromptsUnreadable,

    /// Output directory could not be created.
    OutputDirFailed,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ModelNotFound => "MODEL_NOT_FOUND",
            ErrorCode::ModelLoadFailed => "MODEL_LOAD_FAILED",
            ErrorCode::ModelDownloadFailed => "MODEL_DOWNLOAD_FAILED",
            ErrorCode::ModelInferenceFailed => "MODEL_INFERENCE_FAILED",
            ErrorCode::AudioWriteFailed => "AUDIO_WRITE_FAILED",
            ErrorCode::PromptsUnreadable => "PROMPTS_UNREADABLE",
            ErrorCode::OutputDirFailed => "OUTPUT_DIR_FAILED",
        }
    }

    /// Returns a hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::ModelNotFound => {
                "Run once with network access to download models automatically, \
                 or download them manually from https://huggingface.co/gabotechs/music_gen \
                 and point --model-dir at the directory"
            }
            ErrorCode::ModelLoadFailed => {
                "Check available memory (4GB+ recommended for the small tier), verify the \
                 model files are not truncated, or delete the cache directory and re-download"
            }
            ErrorCode::ModelDownloadFailed => {
                "Check the internet connection and free disk space (500MB+ for the small \
                 tier), or try again later if HuggingFace is unavailable"
            }
            ErrorCode::ModelInferenceFailed => {
                "Try a shorter --duration or a smaller --model tier, or force CPU \
                 execution with MUSICGEN_BATCH_DEVICE=cpu"
            }
            ErrorCode::AudioWriteFailed => {
                "Check free disk space and write permissions on the output directory"
            }
            ErrorCode::PromptsUnreadable => {
                "The prompts file must be UTF-8 text with one prompt per line"
            }
            ErrorCode::OutputDirFailed => {
                "Check that the output path is writable and not shadowed by a regular file"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the batch generator.
#[derive(Debug)]
pub struct BatchError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BatchError {
    /// Creates a new BatchError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new BatchError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a MODEL_NOT_FOUND error.
    pub fn model_not_found(detail: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelNotFound,
            format!("Model files not found: {}", detail.into()),
        )
    }

    /// Creates a MODEL_LOAD_FAILED error.
    pub fn model_load_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelLoadFailed,
            format!("Failed to load model: {}", reason.into()),
        )
    }

    /// Creates a MODEL_DOWNLOAD_FAILED error.
    pub fn model_download_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelDownloadFailed,
            format!("Failed to download model: {}", reason.into()),
        )
    }

    /// Creates a MODEL_INFERENCE_FAILED error.
    pub fn model_inference_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelInferenceFailed,
            format!("Inference failed: {}", reason.into()),
        )
    }

    /// Creates an AUDIO_WRITE_FAILED error.
    pub fn audio_write_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AudioWriteFailed,
            format!("Failed to write audio: {}", reason.into()),
        )
    }

    /// Creates a PROMPTS_UNREADABLE error.
    pub fn prompts_unreadable(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PromptsUnreadable,
            format!("Failed to read prompts file: {}", reason.into()),
        )
    }

    /// Creates an OUTPUT_DIR_FAILED error.
    pub fn output_dir_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::OutputDirFailed,
            format!("Failed to create output directory: {}", reason.into()),
        )
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using BatchError.
pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::ModelNotFound.as_str(), "MODEL_NOT_FOUND");
        assert_eq!(ErrorCode::ModelLoadFailed.as_str(), "MODEL_LOAD_FAILED");
        assert_eq!(ErrorCode::ModelDownloadFailed.as_str(), "MODEL_DOWNLOAD_FAILED");
        assert_eq!(ErrorCode::ModelInferenceFailed.as_str(), "MODEL_INFERENCE_FAILED");
        assert_eq!(ErrorCode::AudioWriteFailed.as_str(), "AUDIO_WRITE_FAILED");
        assert_eq!(ErrorCode::PromptsUnreadable.as_str(), "PROMPTS_UNREADABLE");
        assert_eq!(ErrorCode::OutputDirFailed.as_str(), "OUTPUT_DIR_FAILED");
    }

    #[test]
    fn recovery_hints_not_empty() {
        let codes = [
            ErrorCode::ModelNotFound,
            ErrorCode::ModelLoadFailed,
            ErrorCode::ModelDownloadFailed,
            ErrorCode::ModelInferenceFailed,
            ErrorCode::AudioWriteFailed,
            ErrorCode::PromptsUnreadable,
            ErrorCode::OutputDirFailed,
        ];
        for code in codes {
            assert!(!code.recovery_hint().is_empty());
        }
    }

    #[test]
    fn display_includes_code_and_hint() {
        let err = BatchError::audio_write_failed("disk full");
        let text = err.to_string();
        assert!(text.contains("AUDIO_WRITE_FAILED"));
        assert!(text.contains("disk full"));
        assert!(text.contains("Recovery:"));
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = BatchError::with_source(ErrorCode::AudioWriteFailed, "write failed", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
