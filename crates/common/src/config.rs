//! Muxer configuration.

use serde::{Deserialize, Serialize};

use crate::codec::ContainerFormat;
use crate::error::ConfigError;

/// Default `TimecodeScale`: one tick per millisecond.
pub const DEFAULT_TIMECODE_SCALE_NS: u64 = 1_000_000;

/// Top-level muxer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxConfig {
    /// Container flavour written into the EBML header.
    pub doc_type: ContainerFormat,
    /// Nanoseconds per timecode tick.
    pub timecode_scale_ns: u64,
    /// Segment info `MuxingApp`.
    pub muxing_app: String,
    /// Segment info `WritingApp`.
    pub writing_app: String,
    /// Run a statistics pass over multi-pass capable video sources first.
    pub two_pass: bool,
    /// Emit cue points for video keyframes.
    pub index_video_keyframes: bool,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            doc_type: ContainerFormat::WebM,
            timecode_scale_ns: DEFAULT_TIMECODE_SCALE_NS,
            muxing_app: concat!("wm-mux-", env!("CARGO_PKG_VERSION")).to_string(),
            writing_app: concat!("wm-mux-", env!("CARGO_PKG_VERSION")).to_string(),
            two_pass: false,
            index_video_keyframes: true,
        }
    }
}

impl MuxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timecode_scale_ns == 0 {
            return Err(ConfigError::Invalid(
                "timecode scale must be > 0".to_string(),
            ));
        }
        if self.muxing_app.is_empty() || self.writing_app.is_empty() {
            return Err(ConfigError::Invalid(
                "muxing and writing app names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert seconds to timecode ticks.
    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        seconds * 1_000_000_000.0 / self.timecode_scale_ns as f64
    }
}
