//! Waveclock error types with granular categories

use thiserror::Error;

/// Top-level error type for all Waveclock operations
#[derive(Debug, Error)]
pub enum WaveclockError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: u32 },

    #[error("Invalid RF bandwidth: {bandwidth} Hz (must be > 0)")]
    InvalidBandwidth { bandwidth: f32 },

    #[error("Invalid threshold: {threshold_db} dB (must be > 0)")]
    InvalidThreshold { threshold_db: f32 },

    #[error("Unknown modulation: {name}")]
    UnknownModulation { name: String },
}

/// DSP processing errors
#[derive(Debug, Error)]
pub enum DspError {
    #[error("Filter design failed: {reason}")]
    FilterDesignFailed { reason: String },

    #[error("Cutoff {cutoff} Hz is not below Nyquist for a {sample_rate} Hz input")]
    CutoffAboveNyquist { cutoff: f64, sample_rate: f64 },
}

/// Result type alias for Waveclock operations
pub type Result<T> = std::result::Result<T, WaveclockError>;
