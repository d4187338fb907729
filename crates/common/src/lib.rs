//! `wm-common`: shared types, configuration, and errors for the WebM muxer.
//!
//! - **Codecs**: `VideoCodec`, `AudioCodec`, `ContainerFormat` (Matroska codec ids, doc types)
//! - **Types**: `Rational`, `Resolution`
//! - **Packets**: `BufferedFrame`, `FrameFlags` (what stream sources hand to the muxer)
//! - **Config**: `MuxConfig` (serde-backed)
//! - **Errors**: `SourceError`, `ConfigError` (thiserror-based)

pub mod codec;
pub mod config;
pub mod error;
pub mod packet;
pub mod types;

// Re-export commonly used items at crate root
pub use codec::{AudioCodec, ContainerFormat, VideoCodec};
pub use config::MuxConfig;
pub use error::{ConfigError, SourceError};
pub use packet::{BufferedFrame, FrameFlags};
pub use types::{Rational, Resolution};
