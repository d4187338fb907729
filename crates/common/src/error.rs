//! Error types shared between the muxer and stream sources (thiserror-based).

use thiserror::Error;

/// Errors reported by a stream source (the encoder/decoder behind a track).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Encode failed at frame {frame}: {reason}")]
    EncodeFailed { frame: u64, reason: String },

    #[error("Decode failed at frame {frame}: {reason}")]
    DecodeFailed { frame: u64, reason: String },

    #[error("Source does not support multi-pass encoding")]
    MultiPassUnsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),
}
