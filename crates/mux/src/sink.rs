//! Byte sinks the element writer can target.
//!
//! The writer streams forward but revisits already-written bytes to patch
//! element sizes and the seek table, so a sink must accept writes at any
//! offset inside the prefix it has already received.

use std::io::{self, Seek, SeekFrom, Write};

/// Random-access byte sink.
pub trait ByteSink {
    /// Write `bytes` at absolute `offset`. Offsets past the current end are
    /// only ever the current end itself.
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()>;

    /// Push buffered data to the underlying medium.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink over any seekable writer (files, `Cursor`).
///
/// Offsets are relative to the writer's position when the sink was created,
/// so anything already in the writer before that point is left alone.
/// Tracks its own position so sequential writes never issue a seek.
#[derive(Debug)]
pub struct IoSink<W: Write + Seek> {
    inner: W,
    /// Stream position that offset 0 maps to.
    base: u64,
    /// Absolute stream position of the inner writer.
    position: u64,
}

impl<W: Write + Seek> IoSink<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        let base = inner.stream_position()?;
        Ok(Self {
            inner,
            base,
            position: base,
        })
    }

    /// Stream position the segment starts at.
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> ByteSink for IoSink<W> {
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let target = self.base.checked_add(offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "offset overflows stream position")
        })?;
        if target != self.position {
            self.inner.seek(SeekFrom::Start(target))?;
        }
        self.inner.write_all(bytes)?;
        self.position = target + bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// In-memory sink: buffers the whole segment.
impl ByteSink for Vec<u8> {
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds memory"))?;
        if start > self.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("write at {start} leaves a gap after {}", self.len()),
            ));
        }
        let end = start + bytes.len();
        let overlap = end.min(self.len());
        self[start..overlap].copy_from_slice(&bytes[..overlap - start]);
        self.extend_from_slice(&bytes[overlap - start..]);
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        (**self).write_at(offset, bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn vec_sink_appends() {
        let mut sink = Vec::new();
        sink.write_at(0, b"abc").unwrap();
        sink.write_at(3, b"def").unwrap();
        assert_eq!(sink, b"abcdef");
    }

    #[test]
    fn vec_sink_overwrites_prefix() {
        let mut sink = b"abcdef".to_vec();
        sink.write_at(1, b"XY").unwrap();
        assert_eq!(sink, b"aXYdef");
    }

    #[test]
    fn vec_sink_overwrite_straddles_end() {
        let mut sink = b"abcd".to_vec();
        sink.write_at(2, b"XYZ").unwrap();
        assert_eq!(sink, b"abXYZ");
    }

    #[test]
    fn vec_sink_rejects_gap() {
        let mut sink = b"ab".to_vec();
        assert!(sink.write_at(5, b"x").is_err());
    }

    #[test]
    fn io_sink_patches_and_resumes() {
        let mut sink = IoSink::new(Cursor::new(Vec::new())).unwrap();
        sink.write_at(0, &[0u8; 4]).unwrap();
        sink.write_at(4, b"body").unwrap();
        sink.write_at(0, &[1, 2, 3, 4]).unwrap();
        sink.write_at(8, b"!").unwrap();
        let buf = sink.into_inner().into_inner();
        assert_eq!(buf, [1, 2, 3, 4, b'b', b'o', b'd', b'y', b'!']);
    }

    #[test]
    fn io_sink_offsets_start_at_creation_position() {
        let mut cursor = Cursor::new(b"PREFIX".to_vec());
        cursor.set_position(6);
        let mut sink = IoSink::new(cursor).unwrap();
        assert_eq!(sink.base(), 6);

        sink.write_at(0, &[0u8; 2]).unwrap();
        sink.write_at(2, b"ab").unwrap();
        sink.write_at(0, b"XY").unwrap();
        let buf = sink.into_inner().into_inner();
        assert_eq!(buf, b"PREFIXXYab");
    }
}
