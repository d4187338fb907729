//! SeekHead: reserved up front, patched once every target is written.

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::ebml::{id_width, ClosedElement, EbmlWriter, WritePosition};
use crate::elements as id;
use crate::error::{MuxError, MuxResult};
use crate::sink::ByteSink;

/// Level-1 elements the seek table points at, in SeekHead order.
pub const SEEK_TARGETS: [u32; 3] = [id::TRACKS, id::CUES, id::INFO];

#[derive(Debug)]
struct SeekEntry {
    id: u32,
    /// Payload position of the reserved 8-byte SeekPosition.
    placeholder: WritePosition,
    target: Option<ClosedElement>,
}

/// The segment's seek table.
#[derive(Debug, Default)]
pub struct SeekTable {
    entries: Vec<SeekEntry>,
}

impl SeekTable {
    /// Write the SeekHead with zeroed positions and remember where they are.
    pub fn reserve<S: ByteSink>(w: &mut EbmlWriter<S>) -> MuxResult<Self> {
        let mut entries = Vec::with_capacity(SEEK_TARGETS.len());
        let seek_head = w.start_element(id::SEEK_HEAD)?;
        for target in SEEK_TARGETS {
            let seek = w.start_element(id::SEEK)?;
            let mut id_bytes = [0u8; 4];
            BigEndian::write_u32(&mut id_bytes, target);
            w.write_binary(id::SEEK_ID, &id_bytes[4 - id_width(target) as usize..])?;
            let placeholder = w.write_uint_fixed(id::SEEK_POSITION, 0)?;
            w.end_element(seek)?;
            entries.push(SeekEntry {
                id: target,
                placeholder,
                target: None,
            });
        }
        w.end_element(seek_head)?;
        Ok(Self { entries })
    }

    /// Remember where a target element was written.
    pub fn record(&mut self, closed: ClosedElement) -> MuxResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == closed.id)
            .ok_or_else(|| {
                MuxError::SeekTable(format!("element {:#X} has no seek entry", closed.id))
            })?;
        entry.target = Some(closed);
        Ok(())
    }

    /// Overwrite every placeholder with its target's offset from
    /// `first_l1`, then return the cursor to where it was.
    pub fn patch<S: ByteSink>(
        &self,
        w: &mut EbmlWriter<S>,
        first_l1: WritePosition,
    ) -> MuxResult<()> {
        let mut offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let target = entry.target.ok_or_else(|| {
                MuxError::SeekTable(format!("element {:#X} was never written", entry.id))
            })?;
            let offset = target.start().checked_sub(first_l1).ok_or_else(|| {
                MuxError::SeekTable(format!(
                    "element {:#X} starts before the segment body",
                    entry.id
                ))
            })?;
            offsets.push((entry, offset));
        }

        let resume = w.mark_position();
        for (entry, offset) in offsets {
            w.restore_position(entry.placeholder);
            if let Err(e) = w.write_u64_be(offset) {
                w.restore_position(resume);
                return Err(e);
            }
            debug!(id = entry.id, offset, "seek entry patched");
        }
        w.restore_position(resume);
        Ok(())
    }

    /// Recorded target offsets, in SeekHead order.
    pub fn targets(&self) -> impl Iterator<Item = (u32, Option<ClosedElement>)> + '_ {
        self.entries.iter().map(|e| (e.id, e.target))
    }
}
