//! Cluster maintenance and SimpleBlock serialization.
//!
//! SimpleBlock layout:
//! ```text
//! A3 | size (4-byte vint) | track (0x80 | n) | rel. timecode (i16 BE) | flags | payload
//! ```
//! Flags: bit7 keyframe, bit3 invisible, bits2-1 lacing (always 0 here),
//! bit0 discardable.

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace};
use wm_common::BufferedFrame;

use crate::ebml::{EbmlWriter, ElementHandle, WritePosition};
use crate::elements as id;
use crate::error::{MuxError, MuxResult};
use crate::sink::ByteSink;
use crate::track::MAX_TRACK_NUMBER;

/// Largest distance between a block and its cluster timecode.
pub const MAX_RELATIVE_TIMECODE: i64 = i16::MAX as i64;

/// Track number + timecode + flags.
const BLOCK_HEADER_LEN: u64 = 4;

/// 4-byte size vint marker.
const SIZE_MARKER_4: u32 = 0x1000_0000;

/// Largest SimpleBlock body a 4-byte vint can describe.
const MAX_BLOCK_SIZE: u64 = 0x0FFF_FFFE;

pub const FLAG_KEYFRAME: u8 = 0x80;
pub const FLAG_INVISIBLE: u8 = 0x08;
pub const FLAG_DISCARDABLE: u8 = 0x01;

/// Flag byte for a frame. Lacing is never used.
pub fn block_flags(frame: &BufferedFrame) -> u8 {
    let mut flags = 0;
    if frame.flags.is_key() {
        flags |= FLAG_KEYFRAME;
    }
    if frame.flags.is_alt_ref() {
        flags |= FLAG_INVISIBLE;
    }
    if frame.flags.is_droppable() {
        flags |= FLAG_DISCARDABLE;
    }
    flags
}

/// The open cluster.
#[derive(Debug)]
pub struct ClusterContext {
    /// Absolute cluster timecode in ticks.
    pub timecode: u64,
    pub handle: ElementHandle,
    /// Blocks written so far.
    pub blocks: u64,
}

impl ClusterContext {
    /// Position of the cluster's first id byte.
    pub fn start(&self) -> WritePosition {
        self.handle.position() - crate::ebml::id_width(id::CLUSTER)
    }
}

/// Where a block landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockPlacement {
    /// Start of the owning cluster.
    pub cluster_start: WritePosition,
    /// 1-based index of the block inside its cluster.
    pub block_number: u64,
}

/// Owns the single open cluster and writes blocks into it.
#[derive(Debug, Default)]
pub struct ClusterWriter {
    current: Option<ClusterContext>,
    clusters: u64,
    blocks: u64,
}

impl ClusterWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a block at `timecode` needs a fresh cluster.
    pub fn needs_new_cluster(&self, timecode: u64) -> bool {
        match &self.current {
            None => true,
            Some(cluster) => {
                let delta = timecode as i64 - cluster.timecode as i64;
                !(0..=MAX_RELATIVE_TIMECODE).contains(&delta)
            }
        }
    }

    /// Close the open cluster (if any) and start one at `timecode`.
    pub fn open_cluster<S: ByteSink>(
        &mut self,
        w: &mut EbmlWriter<S>,
        timecode: u64,
    ) -> MuxResult<()> {
        self.close(w)?;
        let handle = w.start_element(id::CLUSTER)?;
        w.write_uint(id::TIMECODE, timecode)?;
        let cluster = ClusterContext {
            timecode,
            handle,
            blocks: 0,
        };
        debug!(timecode, position = cluster.start(), "cluster opened");
        self.current = Some(cluster);
        self.clusters += 1;
        Ok(())
    }

    /// Write `frame` as a SimpleBlock at `timecode` ticks, opening a cluster
    /// first when required.
    pub fn write_block<S: ByteSink>(
        &mut self,
        w: &mut EbmlWriter<S>,
        track: u8,
        timecode: u64,
        frame: &BufferedFrame,
    ) -> MuxResult<BlockPlacement> {
        if track == 0 || track > MAX_TRACK_NUMBER {
            return Err(MuxError::TrackError(format!(
                "track number {track} does not fit a block header"
            )));
        }
        let body = BLOCK_HEADER_LEN + frame.len() as u64;
        if body > MAX_BLOCK_SIZE {
            return Err(MuxError::ElementTooLarge {
                id: id::SIMPLE_BLOCK,
                size: body,
            });
        }

        if self.needs_new_cluster(timecode) {
            self.open_cluster(w, timecode)?;
        }
        let Some(cluster) = self.current.as_mut() else {
            return Err(MuxError::TrackError("no open cluster".into()));
        };
        let relative = (timecode - cluster.timecode) as i16;

        let mut header = [0u8; 9];
        header[0] = id::SIMPLE_BLOCK as u8;
        BigEndian::write_u32(&mut header[1..5], body as u32 | SIZE_MARKER_4);
        header[5] = track | 0x80;
        BigEndian::write_i16(&mut header[6..8], relative);
        header[8] = block_flags(frame);
        w.write_raw(&header)?;
        w.write_raw(&frame.data)?;

        cluster.blocks += 1;
        self.blocks += 1;
        trace!(
            track,
            timestamp_ms = frame.timestamp_ms,
            relative,
            bytes = frame.len(),
            "block"
        );

        Ok(BlockPlacement {
            cluster_start: cluster.start(),
            block_number: cluster.blocks,
        })
    }

    /// Close the open cluster. Each cluster is closed exactly once.
    pub fn close<S: ByteSink>(&mut self, w: &mut EbmlWriter<S>) -> MuxResult<()> {
        if let Some(cluster) = self.current.take() {
            let closed = w.end_element(cluster.handle)?;
            debug!(
                timecode = cluster.timecode,
                blocks = cluster.blocks,
                bytes = closed.size,
                "cluster closed"
            );
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&ClusterContext> {
        self.current.as_ref()
    }

    /// Clusters opened so far.
    pub fn cluster_count(&self) -> u64 {
        self.clusters
    }

    /// Blocks written so far.
    pub fn block_count(&self) -> u64 {
        self.blocks
    }
}
