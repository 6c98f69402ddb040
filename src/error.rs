//! Error types for Susurrus
//!
//! Configuration errors are fatal and abort a mix before any output is
//! written. Degenerate signals (silence, zero variance) are not errors;
//! the analyzers return defined sentinel results instead.

use thiserror::Error;

/// Result type alias using SusurrusError
pub type Result<T> = std::result::Result<T, SusurrusError>;

/// All possible errors in Susurrus
#[derive(Error, Debug)]
pub enum SusurrusError {
    // Audio I/O errors
    #[error("Failed to read audio file: {path}")]
    AudioReadError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWriteError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Unsupported audio format: {details}")]
    UnsupportedFormat { details: String },

    // Configuration errors
    #[error("Audio buffer is empty")]
    EmptyBuffer,

    #[error("Missing required track: {role}")]
    MissingTrack { role: String },

    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: u16, actual: u16 },

    #[error("Crossfade of {crossfade_ms} ms exceeds shorter side ({limit_ms} ms)")]
    CrossfadeTooLong { crossfade_ms: u64, limit_ms: u64 },

    #[error("Invalid mix configuration: {reason}")]
    InvalidConfig { reason: String },

    // Generic I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SusurrusError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SusurrusError::AudioReadError { .. } => "AUDIO_READ_ERROR",
            SusurrusError::AudioWriteError { .. } => "AUDIO_WRITE_ERROR",
            SusurrusError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SusurrusError::EmptyBuffer => "EMPTY_BUFFER",
            SusurrusError::MissingTrack { .. } => "MISSING_TRACK",
            SusurrusError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            SusurrusError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            SusurrusError::CrossfadeTooLong { .. } => "CROSSFADE_TOO_LONG",
            SusurrusError::InvalidConfig { .. } => "INVALID_CONFIG",
            SusurrusError::Io(_) => "IO_ERROR",
            SusurrusError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by fixing inputs and retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            SusurrusError::AudioReadError { .. } => true,
            SusurrusError::UnsupportedFormat { .. } => true,
            SusurrusError::MissingTrack { .. } => true,
            SusurrusError::SampleRateMismatch { .. } => true,
            SusurrusError::ChannelMismatch { .. } => true,
            SusurrusError::CrossfadeTooLong { .. } => true,
            SusurrusError::InvalidConfig { .. } => true,
            _ => false,
        }
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::AudioReadError { .. } => "Check that the file exists and is a valid WAV file",
            Self::UnsupportedFormat { .. } => "Convert to WAV format (16/24/32-bit)",
            Self::EmptyBuffer => "Source files must contain at least one sample",
            Self::MissingTrack { .. } => "Provide all required background tracks",
            Self::SampleRateMismatch { .. } => {
                "Resample all sources to a common rate before mixing"
            }
            Self::ChannelMismatch { .. } => "Convert all sources to the same channel layout",
            Self::CrossfadeTooLong { .. } => {
                "Shorten the crossfade or use longer intro/outro material"
            }
            Self::InvalidConfig { .. } => "Adjust the configuration to satisfy its constraints",
            _ => "Check the error details and try again",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SusurrusError::MissingTrack {
            role: "forest".to_string(),
        };
        assert_eq!(err.error_code(), "MISSING_TRACK");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_errors_not_recoverable_in_place() {
        let err = SusurrusError::EmptyBuffer;
        assert_eq!(err.error_code(), "EMPTY_BUFFER");
        assert!(!err.is_recoverable());
        assert!(!err.recovery_hint().is_empty());
    }
}
