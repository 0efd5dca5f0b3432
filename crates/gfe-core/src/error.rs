//! Error types for the graphical filter editor

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GfeError {
    #[error("Invalid filter length: {0} (expected a power of two between 8 and 8192)")]
    InvalidFilterLength(usize),

    #[error("Invalid FFT size: {0} (expected a power of two, at least 8)")]
    InvalidFftSize(usize),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid channel index: {0}")]
    InvalidChannel(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
}

/// Result type alias
pub type GfeResult<T> = Result<T, GfeError>;
