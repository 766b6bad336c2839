use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Read cursor over a seekable byte stream. All reads are little-endian.
///
/// The total stream length is captured once at construction so region
/// arithmetic never has to re-seek to the end.
pub struct Reader<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<R: Read + Seek> Reader<R> {
    /// Wrap a stream, starting at its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self { inner, pos, len })
    }

    /// Current byte position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the underlying stream.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.len
    }

    /// Remaining bytes from the current position.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Read exactly `n` bytes, or fail with the number actually available.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let have = self.fill(&mut buf)?;
        if have < n {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                need: n,
                have,
            });
        }
        self.pos += n as u64;
        Ok(buf)
    }

    /// Read up to `buf.len()` bytes, returning how many were available.
    /// Short reads advance the position by the amount actually read.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let have = self.fill(buf)?;
        self.pos += have as u64;
        Ok(have)
    }

    /// Read a 4-byte tag (chunk type or fourcc).
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes);
        Ok(tag)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Unwrap the underlying stream, positioned wherever the last read left it.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Writer that assembles a byte buffer. All writes are little-endian.
///
/// Sizes that are unknown until a chunk's body has been written are emitted
/// as placeholders and fixed up with [`Writer::patch_u32`].
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.buf.extend_from_slice(tag);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Patch a u32 at a specific position (for backpatching sizes).
    pub fn patch_u32(&mut self, pos: usize, v: u32) {
        self.buf[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Uniform pack/unpack contract for fixed-layout values.
///
/// Chunk type tags, fourccs, and platform codes all serialize through this,
/// so the header codec composes them without caring about byte layouts.
/// Version fields are the one exception: their own layout depends on the
/// version being read, so the container codec handles them directly.
pub trait StreamCodec: Sized {
    fn unpack<R: Read + Seek>(r: &mut Reader<R>) -> Result<Self>;

    /// Serialize into `w`, returning the number of bytes written.
    fn pack(&self, w: &mut Writer) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_u32_le() {
        let mut r = Reader::new(Cursor::new(vec![0x2a, 0, 0, 0])).unwrap();
        assert_eq!(r.read_u32().unwrap(), 42);
        assert!(r.is_empty());
    }

    #[test]
    fn short_read_reports_available() {
        let mut r = Reader::new(Cursor::new(vec![1, 2])).unwrap();
        let err = r.read_u32().unwrap_err();
        match err {
            Error::UnexpectedEof { need, have, .. } => {
                assert_eq!(need, 4);
                assert_eq!(have, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reader_starts_at_current_position() {
        let mut inner = Cursor::new(vec![0xff, 0x2a, 0, 0, 0]);
        inner.set_position(1);
        let mut r = Reader::new(inner).unwrap();
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u32().unwrap(), 42);
    }

    #[test]
    fn writer_backpatch() {
        let mut w = Writer::new();
        w.write_tag(b"FOLD");
        let at = w.position();
        w.write_u32(0);
        w.write_bytes(b"body");
        w.patch_u32(at, 4);
        assert_eq!(w.into_bytes(), b"FOLD\x04\x00\x00\x00body");
    }
}
