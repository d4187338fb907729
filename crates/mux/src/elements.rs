//! Matroska/WebM element IDs written by the muxer.
//!
//! IDs keep their EBML length-marker bits, so the constant's byte
//! representation is exactly what goes on the wire.

// ─── EBML Header ─────────────────────────────────────────────────────

/// EBML Header element (container).
pub const EBML_HEADER: u32 = 0x1A45DFA3;
pub const EBML_VERSION: u32 = 0x4286;
pub const EBML_READ_VERSION: u32 = 0x42F7;
pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
/// Document type string ("webm" or "matroska").
pub const DOC_TYPE: u32 = 0x4282;
pub const DOC_TYPE_VERSION: u32 = 0x4287;
pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

// ─── Segment ─────────────────────────────────────────────────────────

/// Segment (top-level container for all data).
pub const SEGMENT: u32 = 0x18538067;

// ─── Meta Seek Information ───────────────────────────────────────────

pub const SEEK_HEAD: u32 = 0x114D9B74;
pub const SEEK: u32 = 0x4DBB;
/// SeekID: binary copy of the located element's ID.
pub const SEEK_ID: u32 = 0x53AB;
/// SeekPosition: offset relative to the first level-1 element.
pub const SEEK_POSITION: u32 = 0x53AC;

// ─── Segment Information ─────────────────────────────────────────────

pub const INFO: u32 = 0x1549A966;
/// Nanoseconds per timecode tick.
pub const TIMECODE_SCALE: u32 = 0x2AD7B1;
/// Segment duration in ticks (float).
pub const DURATION: u32 = 0x4489;
pub const MUXING_APP: u32 = 0x4D80;
pub const WRITING_APP: u32 = 0x5741;

// ─── Tracks ──────────────────────────────────────────────────────────

pub const TRACKS: u32 = 0x1654AE6B;
pub const TRACK_ENTRY: u32 = 0xAE;
pub const TRACK_NUMBER: u32 = 0xD7;
pub const TRACK_UID: u32 = 0x73C5;
/// 1 = video, 2 = audio.
pub const TRACK_TYPE: u32 = 0x83;
pub const FLAG_LACING: u32 = 0x9C;
pub const CODEC_ID: u32 = 0x86;
pub const CODEC_NAME: u32 = 0x258688;
pub const CODEC_PRIVATE: u32 = 0x63A2;

pub const VIDEO: u32 = 0xE0;
pub const PIXEL_WIDTH: u32 = 0xB0;
pub const PIXEL_HEIGHT: u32 = 0xBA;
pub const FRAME_RATE: u32 = 0x2383E3;

pub const AUDIO: u32 = 0xE1;
pub const SAMPLING_FREQUENCY: u32 = 0xB5;
pub const CHANNELS: u32 = 0x9F;

// ─── Cluster ─────────────────────────────────────────────────────────

pub const CLUSTER: u32 = 0x1F43B675;
/// Cluster timecode in ticks.
pub const TIMECODE: u32 = 0xE7;
pub const SIMPLE_BLOCK: u32 = 0xA3;

// ─── Cueing Data ─────────────────────────────────────────────────────

pub const CUES: u32 = 0x1C53BB6B;
pub const CUE_POINT: u32 = 0xBB;
pub const CUE_TIME: u32 = 0xB3;
pub const CUE_TRACK_POSITIONS: u32 = 0xB7;
pub const CUE_TRACK: u32 = 0xF7;
pub const CUE_CLUSTER_POSITION: u32 = 0xF1;
pub const CUE_BLOCK_NUMBER: u32 = 0x5378;

/// TrackType value for video tracks.
pub const TRACK_TYPE_VIDEO: u64 = 1;
/// TrackType value for audio tracks.
pub const TRACK_TYPE_AUDIO: u64 = 2;
