//! Low-level EBML element writing.
//!
//! EBML elements are `[id][size vint][payload]`. IDs keep their length
//! marker bits; sizes are variable-length integers with a leading-1 marker:
//! - 1 byte:  `1xxx xxxx`
//! - 2 bytes: `01xx xxxx xxxx xxxx`
//! - 8 bytes: `0000 0001` followed by 7 data bytes
//!
//! Master elements whose length is unknown when they are opened always
//! reserve an 8-byte size field holding the "unknown size" marker. Closing
//! the element seeks back, writes the real size into those 8 bytes and
//! returns the cursor to the end of the data, so element bodies are never
//! buffered in memory.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{MuxError, MuxResult};
use crate::sink::ByteSink;

/// Absolute byte offset into the output.
pub type WritePosition = u64;

/// Width of the size field reserved by [`EbmlWriter::start_element`].
pub const SIZE_FIELD_LEN: u64 = 8;

/// 8-byte size vint with every data bit set: "size unknown".
pub const UNKNOWN_SIZE: u64 = 0x01FF_FFFF_FFFF_FFFF;

/// Length marker of an 8-byte size vint, sitting in the top byte.
const SIZE_MARKER_8: u64 = 0x0100_0000_0000_0000;

/// Largest size an 8-byte vint can carry (all-ones is reserved).
const MAX_SIZE_8: u64 = UNKNOWN_SIZE - SIZE_MARKER_8 - 1;

/// An open master element: the position of its reserved size field.
///
/// Not `Clone`: each handle is closed exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an open element must be closed with end_element"]
pub struct ElementHandle {
    id: u32,
    position: WritePosition,
}

impl ElementHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Position of the 8-byte size field (just past the id).
    pub fn position(&self) -> WritePosition {
        self.position
    }
}

/// Where a closed element ended up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClosedElement {
    pub id: u32,
    /// Position of the size field.
    pub position: WritePosition,
    /// Payload size in bytes.
    pub size: u64,
}

impl ClosedElement {
    /// Position of the element's first id byte.
    pub fn start(&self) -> WritePosition {
        self.position - id_width(self.id)
    }

    /// Position just past the payload.
    pub fn end(&self) -> WritePosition {
        self.position + SIZE_FIELD_LEN + self.size
    }
}

/// Number of bytes an element id occupies on the wire.
pub fn id_width(id: u32) -> u64 {
    match id {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Number of bytes needed for the minimal size vint of `size`.
pub fn vint_width(size: u64) -> u64 {
    (1..=8u64)
        .find(|&width| size < (1u64 << (7 * width)) - 1)
        .unwrap_or(8)
}

/// Minimal big-endian width of an unsigned value (at least one byte).
fn uint_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Append-only element writer with backpatching.
#[derive(Debug)]
pub struct EbmlWriter<S: ByteSink> {
    sink: S,
    /// Current write cursor.
    position: WritePosition,
    /// Logical end of written data.
    end: WritePosition,
}

impl<S: ByteSink> EbmlWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            position: 0,
            end: 0,
        }
    }

    /// Current write cursor.
    pub fn position(&self) -> WritePosition {
        self.position
    }

    /// Total bytes written so far.
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Append bytes verbatim.
    pub fn write_raw(&mut self, bytes: &[u8]) -> MuxResult<()> {
        self.sink.write_at(self.position, bytes)?;
        self.position += bytes.len() as u64;
        self.end = self.end.max(self.position);
        Ok(())
    }

    /// Append bytes in reverse order (little-endian buffer to big-endian wire).
    pub fn write_reversed(&mut self, bytes: &[u8]) -> MuxResult<()> {
        let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
        self.write_raw(&reversed)
    }

    pub fn write_u64_be(&mut self, value: u64) -> MuxResult<()> {
        self.write_reversed(&value.to_le_bytes())
    }

    /// Write an element id in its natural width.
    pub fn write_id(&mut self, id: u32) -> MuxResult<()> {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, id);
        let width = id_width(id) as usize;
        self.write_raw(&buf[4 - width..])
    }

    /// Write a minimal-width size vint for the payload of element `id`.
    pub fn write_size(&mut self, id: u32, size: u64) -> MuxResult<()> {
        let width = vint_width(size);
        if width == 8 && size > MAX_SIZE_8 {
            return Err(MuxError::ElementTooLarge { id, size });
        }
        let marked = size | (1u64 << (7 * width));
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, marked);
        self.write_raw(&buf[8 - width as usize..])
    }

    /// Open a master element of unknown length.
    pub fn start_element(&mut self, id: u32) -> MuxResult<ElementHandle> {
        self.write_id(id)?;
        let position = self.position;
        self.write_u64_be(UNKNOWN_SIZE)?;
        Ok(ElementHandle { id, position })
    }

    /// Close a master element: patch its size field and restore the cursor.
    pub fn end_element(&mut self, handle: ElementHandle) -> MuxResult<ClosedElement> {
        let current = self.position;
        let size = current - handle.position - SIZE_FIELD_LEN;
        if size > MAX_SIZE_8 {
            return Err(MuxError::ElementTooLarge {
                id: handle.id,
                size,
            });
        }

        self.position = handle.position;
        self.write_u64_be(size | SIZE_MARKER_8)?;
        self.position = current;

        Ok(ClosedElement {
            id: handle.id,
            position: handle.position,
            size,
        })
    }

    /// Remember the cursor.
    pub fn mark_position(&self) -> WritePosition {
        self.position
    }

    /// Move the cursor to a previously marked position.
    pub fn restore_position(&mut self, saved: WritePosition) {
        debug_assert!(saved <= self.end, "cursor moved past written data");
        self.position = saved;
    }

    /// Unsigned integer element, minimal payload width.
    pub fn write_uint(&mut self, id: u32, value: u64) -> MuxResult<()> {
        let width = uint_width(value);
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, value);
        self.write_id(id)?;
        self.write_raw(&[0x80 | width as u8])?;
        self.write_raw(&buf[8 - width..])
    }

    /// Unsigned integer element with an 8-byte payload.
    ///
    /// Returns the payload position so the value can be overwritten later.
    pub fn write_uint_fixed(&mut self, id: u32, value: u64) -> MuxResult<WritePosition> {
        self.write_id(id)?;
        self.write_raw(&[0x88])?;
        let payload = self.position;
        self.write_u64_be(value)?;
        Ok(payload)
    }

    /// 8-byte IEEE float element.
    pub fn write_float(&mut self, id: u32, value: f64) -> MuxResult<()> {
        self.write_id(id)?;
        self.write_raw(&[0x88])?;
        self.write_reversed(&value.to_le_bytes())
    }

    pub fn write_string(&mut self, id: u32, value: &str) -> MuxResult<()> {
        self.write_binary(id, value.as_bytes())
    }

    pub fn write_binary(&mut self, id: u32, data: &[u8]) -> MuxResult<()> {
        self.write_id(id)?;
        self.write_size(id, data.len() as u64)?;
        self.write_raw(data)
    }

    pub fn flush(&mut self) -> MuxResult<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
