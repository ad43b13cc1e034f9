//! Error types for waveform generation and packing.

use thiserror::Error;

/// Result type for waveform operations.
pub type WaveformResult<T> = Result<T, WaveformError>;

/// Errors that can occur while generating, packing or writing a waveform.
#[derive(Debug, Error)]
pub enum WaveformError {
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration '{field}': {message}")]
    Configuration {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A quantized code does not fit the DAC field of the register.
    #[error("sample {index} quantized to {value}, outside the DAC field 0..={max}")]
    Overflow {
        /// Sample index in time order.
        index: usize,
        /// Quantized code before shifting.
        value: i64,
        /// Largest code the field can hold.
        max: u16,
    },

    /// The cosine evaluated to NaN or infinity.
    #[error("sample {index} is not a finite number")]
    NonFiniteSample {
        /// Sample index in time order.
        index: usize,
    },

    /// A packed buffer must hold whole 16-bit words.
    #[error("packed buffer has odd length {len}")]
    OddLength {
        /// Buffer length in bytes.
        len: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Renaming the temporary file over the destination failed.
    #[error("failed to persist output: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// Malformed JSON configuration.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// WAV preview writer failure.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl WaveformError {
    /// Creates a configuration error.
    pub fn config(field: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            message: message.into(),
        }
    }

    /// Returns true for configuration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
