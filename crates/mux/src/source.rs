//! Stream source interface: the boundary to external encoders.
//!
//! One source feeds one track. The session pulls from a source whenever its
//! queue runs dry; a pull may block on the encoder behind it.

use wm_common::{AudioCodec, BufferedFrame, Rational, Resolution, SourceError, VideoCodec};

/// Video track description.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoTrackConfig {
    pub codec: VideoCodec,
    pub resolution: Resolution,
    pub frame_rate: Rational,
    /// Optional codec initialization data.
    pub codec_private: Option<Vec<u8>>,
}

/// Audio track description.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrackConfig {
    pub codec: AudioCodec,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    pub channels: u16,
    /// Codec initialization data (Xiph-laced Vorbis headers, OpusHead).
    pub codec_private: Vec<u8>,
}

/// Per-kind track metadata.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackConfig {
    Video(VideoTrackConfig),
    Audio(AudioTrackConfig),
}

impl TrackConfig {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    pub fn codec_id(&self) -> &'static str {
        match self {
            Self::Video(v) => v.codec.codec_id(),
            Self::Audio(a) => a.codec.codec_id(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
        }
    }
}

/// Which encode pass a source is about to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodePass {
    /// Ordinary single-pass encode.
    Single,
    /// First pass: gather rate-control statistics, output is discarded.
    Analyze,
    /// Second pass: encode for real using the first pass's statistics.
    Final { stats: Vec<u8> },
}

/// Result of one pull from a source.
#[derive(Debug, Default)]
pub struct SourcePull {
    /// Frames in presentation order.
    pub frames: Vec<BufferedFrame>,
    /// Rate-control statistics produced during an analysis pass.
    pub stats: Vec<u8>,
    /// No more frames will follow.
    pub end_of_stream: bool,
}

impl SourcePull {
    pub fn frames(frames: Vec<BufferedFrame>) -> Self {
        Self {
            frames,
            ..Default::default()
        }
    }

    pub fn end_of_stream() -> Self {
        Self {
            end_of_stream: true,
            ..Default::default()
        }
    }
}

/// Producer of compressed frames for one track.
pub trait StreamSource {
    /// Track metadata written into the `Tracks` element.
    fn track(&self) -> &TrackConfig;

    /// Produce more frames. May block on the encoder.
    fn pull_more(&mut self) -> Result<SourcePull, SourceError>;

    /// Expected duration in seconds, used for segment info and progress.
    fn estimated_duration(&self) -> f64;

    /// Whether the source can run a statistics pass followed by a final pass.
    fn supports_multi_pass(&self) -> bool {
        false
    }

    /// Rewind to the first frame.
    fn reset_to_start(&mut self) -> Result<(), SourceError> {
        Err(SourceError::MultiPassUnsupported)
    }

    /// Configure the encoder for the upcoming pass.
    fn begin_pass(&mut self, _pass: &EncodePass) -> Result<(), SourceError> {
        Ok(())
    }

    /// Send the encoder a terminating request and collect any statistics it
    /// still holds. An empty result means the encoder is drained.
    fn flush_pass(&mut self) -> Result<Vec<u8>, SourceError> {
        Ok(Vec::new())
    }
}

/// Source over frames that are already compressed (remuxing, tests).
///
/// Hands out at most `chunk` frames per pull and reports end of stream
/// together with the last chunk.
#[derive(Debug)]
pub struct FrameListSource {
    track: TrackConfig,
    frames: Vec<BufferedFrame>,
    next: usize,
    chunk: usize,
    duration: f64,
}

impl FrameListSource {
    pub fn new(track: TrackConfig, frames: Vec<BufferedFrame>) -> Self {
        let duration = frames
            .iter()
            .map(|f| f.timestamp_ms)
            .max()
            .map_or(0.0, |ms| ms as f64 / 1000.0);
        Self {
            track,
            frames,
            next: 0,
            chunk: 1,
            duration,
        }
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }
}

impl StreamSource for FrameListSource {
    fn track(&self) -> &TrackConfig {
        &self.track
    }

    fn pull_more(&mut self) -> Result<SourcePull, SourceError> {
        let end = (self.next + self.chunk).min(self.frames.len());
        let frames = self.frames[self.next..end].to_vec();
        self.next = end;
        Ok(SourcePull {
            frames,
            stats: Vec::new(),
            end_of_stream: self.next == self.frames.len(),
        })
    }

    fn estimated_duration(&self) -> f64 {
        self.duration
    }
}
