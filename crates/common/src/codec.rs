//! Video/audio codec and container format enums.

use serde::{Deserialize, Serialize};

/// Video codec identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    Vp8,
    Vp9,
    Av1,
}

impl VideoCodec {
    /// Matroska `CodecID` string.
    pub fn codec_id(self) -> &'static str {
        match self {
            Self::Vp8 => "V_VP8",
            Self::Vp9 => "V_VP9",
            Self::Av1 => "V_AV1",
        }
    }

    /// Human-readable name, written as the track's `CodecName`.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vp8 => "VP8",
            Self::Vp9 => "VP9",
            Self::Av1 => "AV1",
        }
    }
}

/// Audio codec identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCodec {
    Vorbis,
    Opus,
}

impl AudioCodec {
    /// Matroska `CodecID` string.
    pub fn codec_id(self) -> &'static str {
        match self {
            Self::Vorbis => "A_VORBIS",
            Self::Opus => "A_OPUS",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vorbis => "VORBIS",
            Self::Opus => "OPUS",
        }
    }
}

/// Container flavour, selects the EBML `DocType`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// WebM (Matroska subset).
    #[default]
    WebM,
    /// Full Matroska.
    Matroska,
}

impl ContainerFormat {
    /// Value of the EBML header `DocType` element.
    pub fn doc_type(self) -> &'static str {
        match self {
            Self::WebM => "webm",
            Self::Matroska => "matroska",
        }
    }
}
