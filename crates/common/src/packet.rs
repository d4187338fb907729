//! Compressed frames produced by stream sources and consumed by the muxer.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask describing a compressed frame.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub const NONE: Self = Self(0);
    /// Decodable without reference to other frames.
    pub const KEY: Self = Self(0x01);
    /// May be dropped by a player without affecting later frames.
    pub const DROPPABLE: Self = Self(0x02);
    /// Alternate reference frame, decoded but never shown.
    pub const ALT_REF: Self = Self(0x04);
    /// Set for video frames, clear for audio.
    pub const VIDEO: Self = Self(0x08);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_key(self) -> bool {
        self.contains(Self::KEY)
    }

    pub fn is_droppable(self) -> bool {
        self.contains(Self::DROPPABLE)
    }

    pub fn is_alt_ref(self) -> bool {
        self.contains(Self::ALT_REF)
    }

    pub fn is_video(self) -> bool {
        self.contains(Self::VIDEO)
    }
}

impl BitOr for FrameFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FrameFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FrameFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.is_key() {
            names.push("KEY");
        }
        if self.is_droppable() {
            names.push("DROPPABLE");
        }
        if self.is_alt_ref() {
            names.push("ALT_REF");
        }
        if self.is_video() {
            names.push("VIDEO");
        }
        write!(f, "FrameFlags({})", names.join(" | "))
    }
}

/// One compressed frame waiting to be muxed.
///
/// The payload is owned exclusively by the frame; it moves from the source
/// into a frame queue and is released once the block has been written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferedFrame {
    /// Compressed bitstream data.
    pub data: Vec<u8>,
    /// Presentation timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Frame classification supplied by the encoder.
    pub flags: FrameFlags,
    /// Decode-order index within its stream.
    pub index: u64,
}

impl BufferedFrame {
    pub fn video(data: Vec<u8>, timestamp_ms: u64, index: u64, is_keyframe: bool) -> Self {
        let mut flags = FrameFlags::VIDEO;
        if is_keyframe {
            flags |= FrameFlags::KEY;
        }
        Self {
            data,
            timestamp_ms,
            flags,
            index,
        }
    }

    /// Audio frames are always independently decodable.
    pub fn audio(data: Vec<u8>, timestamp_ms: u64, index: u64) -> Self {
        Self {
            data,
            timestamp_ms,
            flags: FrameFlags::KEY,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags.is_key()
    }
}
