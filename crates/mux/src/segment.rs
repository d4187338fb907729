//! Segment layout and finalization.
//!
//! Emission order:
//! ```text
//! EBML header
//! Segment
//!   SeekHead   (positions reserved, patched at finalize)
//!   Tracks
//!   Info
//!   Cluster*
//!   Cues
//! ```

use tracing::info;
use wm_common::{BufferedFrame, MuxConfig};

use crate::cluster::ClusterWriter;
use crate::cues::{CueIndex, CuePoint};
use crate::ebml::{ClosedElement, EbmlWriter, ElementHandle, WritePosition};
use crate::elements as id;
use crate::error::MuxResult;
use crate::seek::SeekTable;
use crate::sink::ByteSink;
use crate::source::TrackConfig;
use crate::track::write_tracks;

/// What ended up in a finished segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentSummary {
    /// Total bytes in the output, EBML header included.
    pub bytes_written: u64,
    pub clusters: u64,
    pub blocks: u64,
    pub cues: u64,
}

/// Write the EBML header.
pub fn write_ebml_header<S: ByteSink>(
    w: &mut EbmlWriter<S>,
    config: &MuxConfig,
) -> MuxResult<ClosedElement> {
    let header = w.start_element(id::EBML_HEADER)?;
    w.write_uint(id::EBML_VERSION, 1)?;
    w.write_uint(id::EBML_READ_VERSION, 1)?;
    w.write_uint(id::EBML_MAX_ID_LENGTH, 4)?;
    w.write_uint(id::EBML_MAX_SIZE_LENGTH, 8)?;
    w.write_string(id::DOC_TYPE, config.doc_type.doc_type())?;
    w.write_uint(id::DOC_TYPE_VERSION, 2)?;
    w.write_uint(id::DOC_TYPE_READ_VERSION, 2)?;
    w.end_element(header)
}

/// Write segment `Info`. `duration_s` is converted to timecode ticks.
pub fn write_info<S: ByteSink>(
    w: &mut EbmlWriter<S>,
    config: &MuxConfig,
    duration_s: f64,
) -> MuxResult<ClosedElement> {
    let info = w.start_element(id::INFO)?;
    w.write_uint(id::TIMECODE_SCALE, config.timecode_scale_ns)?;
    w.write_float(id::DURATION, config.seconds_to_ticks(duration_s))?;
    w.write_string(id::MUXING_APP, &config.muxing_app)?;
    w.write_string(id::WRITING_APP, &config.writing_app)?;
    w.end_element(info)
}

/// An open segment accepting frames.
#[derive(Debug)]
pub struct SegmentWriter<S: ByteSink> {
    writer: EbmlWriter<S>,
    segment: ElementHandle,
    /// Position of the first level-1 element (just past the Segment size).
    first_l1: WritePosition,
    seek: SeekTable,
    clusters: ClusterWriter,
    cues: CueIndex,
    /// Whether each track (indexed by number - 1) is video.
    video_tracks: Vec<bool>,
    timecode_scale_ns: u64,
    index_video_keyframes: bool,
}

impl<S: ByteSink> SegmentWriter<S> {
    /// Write everything up to the first cluster.
    pub fn begin(
        sink: S,
        config: &MuxConfig,
        tracks: &[&TrackConfig],
        duration_s: f64,
    ) -> MuxResult<Self> {
        config.validate()?;

        let mut writer = EbmlWriter::new(sink);
        write_ebml_header(&mut writer, config)?;
        let segment = writer.start_element(id::SEGMENT)?;
        let first_l1 = writer.position();

        let mut seek = SeekTable::reserve(&mut writer)?;
        seek.record(write_tracks(&mut writer, tracks)?)?;
        seek.record(write_info(&mut writer, config, duration_s)?)?;

        info!(
            doc_type = config.doc_type.doc_type(),
            tracks = tracks.len(),
            duration_s,
            "segment started"
        );

        Ok(Self {
            writer,
            segment,
            first_l1,
            seek,
            clusters: ClusterWriter::new(),
            cues: CueIndex::new(),
            video_tracks: tracks.iter().map(|t| t.is_video()).collect(),
            timecode_scale_ns: config.timecode_scale_ns,
            index_video_keyframes: config.index_video_keyframes,
        })
    }

    /// Milliseconds to timecode ticks.
    pub fn ms_to_ticks(&self, ms: u64) -> u64 {
        (u128::from(ms) * 1_000_000 / u128::from(self.timecode_scale_ns)) as u64
    }

    fn is_video_track(&self, track: u8) -> bool {
        usize::from(track)
            .checked_sub(1)
            .and_then(|i| self.video_tracks.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Write one frame as a block and index it if it is a keyframe on a
    /// video track. The track kind decides, not the frame's own flags.
    pub fn write_frame(&mut self, track: u8, frame: &BufferedFrame) -> MuxResult<()> {
        let timecode = self.ms_to_ticks(frame.timestamp_ms);
        let placed = self
            .clusters
            .write_block(&mut self.writer, track, timecode, frame)?;

        if self.index_video_keyframes && frame.is_keyframe() && self.is_video_track(track) {
            self.cues.push(CuePoint {
                time: timecode,
                track,
                cluster_position: placed.cluster_start - self.first_l1,
                block_number: placed.block_number,
            });
        }
        Ok(())
    }

    pub fn first_l1(&self) -> WritePosition {
        self.first_l1
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.len()
    }

    /// Close the last cluster, write Cues, close the Segment and patch the
    /// seek table. Returns the sink.
    pub fn finalize(mut self) -> MuxResult<(S, SegmentSummary)> {
        self.clusters.close(&mut self.writer)?;
        let cues = self.cues.write(&mut self.writer)?;
        self.seek.record(cues)?;
        self.writer.end_element(self.segment)?;
        self.seek.patch(&mut self.writer, self.first_l1)?;
        self.writer.flush()?;

        let summary = SegmentSummary {
            bytes_written: self.writer.len(),
            clusters: self.clusters.cluster_count(),
            blocks: self.clusters.block_count(),
            cues: self.cues.len() as u64,
        };
        info!(
            bytes = summary.bytes_written,
            clusters = summary.clusters,
            blocks = summary.blocks,
            cues = summary.cues,
            "segment finalized"
        );
        Ok((self.writer.into_sink(), summary))
    }
}
