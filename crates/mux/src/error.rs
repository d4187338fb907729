//! Muxer error types.

use thiserror::Error;
use wm_common::{ConfigError, SourceError};

/// Errors that can occur during WebM muxing.
///
/// Every variant is fatal for the session: the output is only valid when
/// the segment, cues and seek table have all been written.
#[derive(Error, Debug)]
pub enum MuxError {
    /// The byte sink rejected a write or seek.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid muxer configuration.
    #[error("Invalid muxer config: {0}")]
    InvalidConfig(String),

    /// Track-related error (e.g. too many tracks, unknown track number).
    #[error("Track error: {0}")]
    TrackError(String),

    /// A stream source failed while producing data.
    #[error("Source error on track {track}: {source}")]
    Source {
        track: u8,
        #[source]
        source: SourceError,
    },

    /// An element body outgrew its size field.
    #[error("Element 0x{id:X} too large: {size} bytes")]
    ElementTooLarge { id: u32, size: u64 },

    /// Allocation failure while accumulating rate-control statistics.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Seek table could not be finalized.
    #[error("Seek table error: {0}")]
    SeekTable(String),
}

impl From<ConfigError> for MuxError {
    fn from(err: ConfigError) -> Self {
        MuxError::InvalidConfig(err.to_string())
    }
}

/// Convenience Result type for mux operations.
pub type MuxResult<T> = Result<T, MuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let mux_err = MuxError::from(io_err);
        assert!(mux_err.to_string().contains("IO error"));
        assert!(mux_err.to_string().contains("file not found"));
    }

    #[test]
    fn mux_error_display_track_error() {
        let err = MuxError::TrackError("track 200 out of range".into());
        assert_eq!(err.to_string(), "Track error: track 200 out of range");
    }

    #[test]
    fn mux_error_display_source() {
        let err = MuxError::Source {
            track: 2,
            source: SourceError::EncodeFailed {
                frame: 7,
                reason: "bad input".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("track 2"));
        assert!(msg.contains("bad input"));
    }

    #[test]
    fn mux_error_display_element_too_large() {
        let err = MuxError::ElementTooLarge {
            id: 0xA3,
            size: 1 << 30,
        };
        assert!(err.to_string().contains("0xA3"));
    }

    #[test]
    fn mux_error_from_config_error() {
        let err: MuxError = ConfigError::Invalid("zero scale".into()).into();
        assert!(matches!(err, MuxError::InvalidConfig(_)));
    }
}
