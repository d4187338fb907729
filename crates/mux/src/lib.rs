//! `wm-mux`: WebM/Matroska container muxer.
//!
//! Merges independently produced, time-stamped compressed audio and video
//! frames into one seekable WebM file with a keyframe cue index and a seek
//! table.
//!
//! # Architecture
//!
//! - **Single forward pass**: master elements reserve an 8-byte size field
//!   and are backpatched on close, so element bodies are never buffered
//! - **Strict interleaving**: blocks leave the scheduler in non-decreasing
//!   timestamp order across all tracks
//! - **Seek table last**: SeekHead is reserved first and patched once
//!   Tracks, Info and Cues are written
//! - **Two-pass video**: multi-pass capable encoders run an analysis pass
//!   before the output pass
//!
//! # Usage
//!
//! ```ignore
//! use wm_mux::{FrameListSource, MuxSession, TrackConfig, VideoTrackConfig};
//! use wm_common::{MuxConfig, Rational, Resolution, VideoCodec};
//!
//! let mut session = MuxSession::create_file("output.webm", MuxConfig::default())?;
//! session.add_stream(Box::new(FrameListSource::new(
//!     TrackConfig::Video(VideoTrackConfig {
//!         codec: VideoCodec::Vp8,
//!         resolution: Resolution::HD,
//!         frame_rate: Rational::FPS_30,
//!         codec_private: None,
//!     }),
//!     frames,
//! )))?;
//! session.set_progress(|fraction: f64| println!("{:.0}%", fraction * 100.0));
//!
//! let report = session.run()?;
//! ```

pub mod cluster;
pub mod cues;
pub mod ebml;
pub mod elements;
pub mod error;
pub mod progress;
pub mod queue;
pub mod seek;
pub mod segment;
pub mod session;
pub mod sink;
pub mod source;
pub mod track;

// Re-export primary API types
pub use ebml::{ClosedElement, EbmlWriter, ElementHandle, WritePosition};
pub use error::{MuxError, MuxResult};
pub use progress::{MuxProgress, ProgressSink};
pub use segment::{SegmentSummary, SegmentWriter};
pub use session::{MuxReport, MuxSession, MuxSummary};
pub use sink::{ByteSink, IoSink};
pub use source::{
    AudioTrackConfig, EncodePass, FrameListSource, SourcePull, StreamSource, TrackConfig,
    VideoTrackConfig,
};
pub use track::xiph_codec_private;
