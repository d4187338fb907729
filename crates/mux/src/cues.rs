//! Cue index: keyframe seek points written after the last cluster.

use tracing::debug;

use crate::ebml::{ClosedElement, EbmlWriter};
use crate::elements as id;
use crate::error::MuxResult;
use crate::sink::ByteSink;

/// One seek point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CuePoint {
    /// Block timestamp in timecode ticks.
    pub time: u64,
    pub track: u8,
    /// Offset of the owning cluster relative to the first level-1 element.
    pub cluster_position: u64,
    /// 1-based index of the block within its cluster.
    pub block_number: u64,
}

/// Append-only list of cue points.
#[derive(Debug, Default)]
pub struct CueIndex {
    points: Vec<CuePoint>,
}

impl CueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: CuePoint) {
        debug!(
            track = point.track,
            time = point.time,
            cluster_position = point.cluster_position,
            block = point.block_number,
            "cue point"
        );
        self.points.push(point);
    }

    pub fn points(&self) -> &[CuePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Serialize every point into a `Cues` element. An empty index still
    /// produces an empty `Cues` element.
    pub fn write<S: ByteSink>(&self, w: &mut EbmlWriter<S>) -> MuxResult<ClosedElement> {
        let cues = w.start_element(id::CUES)?;
        for point in &self.points {
            let cue_point = w.start_element(id::CUE_POINT)?;
            w.write_uint(id::CUE_TIME, point.time)?;

            let positions = w.start_element(id::CUE_TRACK_POSITIONS)?;
            w.write_uint(id::CUE_TRACK, u64::from(point.track))?;
            w.write_uint_fixed(id::CUE_CLUSTER_POSITION, point.cluster_position)?;
            w.write_uint(id::CUE_BLOCK_NUMBER, point.block_number)?;
            w.end_element(positions)?;

            w.end_element(cue_point)?;
        }
        w.end_element(cues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index_writes_empty_cues() {
        let mut w = EbmlWriter::new(Vec::new());
        let closed = CueIndex::new().write(&mut w).unwrap();
        assert_eq!(closed.size, 0);
        assert_eq!(
            w.into_sink(),
            [0x1C, 0x53, 0xBB, 0x6B, 0x01, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_cue_point_layout() {
        let mut index = CueIndex::new();
        index.push(CuePoint {
            time: 33,
            track: 1,
            cluster_position: 0x1234,
            block_number: 2,
        });

        let mut w = EbmlWriter::new(Vec::new());
        index.write(&mut w).unwrap();
        let buf = w.into_sink();

        // Cues header (12) + CuePoint header (9)
        let body = &buf[21..];
        assert_eq!(&body[..3], &[0xB3, 0x81, 33]);
        // CueTrackPositions header (9)
        let positions = &body[3 + 9..];
        assert_eq!(&positions[..3], &[0xF7, 0x81, 0x01]);
        assert_eq!(
            &positions[3..13],
            &[0xF1, 0x88, 0, 0, 0, 0, 0, 0, 0x12, 0x34]
        );
        assert_eq!(&positions[13..], &[0x53, 0x78, 0x81, 0x02]);
    }

    #[test]
    fn test_every_point_is_written() {
        let mut index = CueIndex::new();
        for i in 0..3 {
            index.push(CuePoint {
                time: i * 1000,
                track: 1,
                cluster_position: 0,
                block_number: 1,
            });
        }
        assert_eq!(index.len(), 3);

        let mut w = EbmlWriter::new(Vec::new());
        index.write(&mut w).unwrap();
        let buf = w.into_sink();
        // CuePoint id followed by its 8-byte size marker
        let points = buf.windows(2).filter(|w| *w == [0xBB, 0x01]).count();
        assert_eq!(points, 3);
    }
}
