use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::cursor::{Reader, StreamCodec, Writer};
use crate::error::{Error, Result};
use crate::fourcc::FourCC;

/// The two chunk kinds. Every chunk in a container is one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Folder,
    Data,
}

impl ChunkKind {
    pub const FOLDER_TAG: [u8; 4] = *b"FOLD";
    pub const DATA_TAG: [u8; 4] = *b"DATA";

    pub fn tag(self) -> [u8; 4] {
        match self {
            ChunkKind::Folder => Self::FOLDER_TAG,
            ChunkKind::Data => Self::DATA_TAG,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkKind::Folder => f.write_str("FOLD"),
            ChunkKind::Data => f.write_str("DATA"),
        }
    }
}

impl StreamCodec for ChunkKind {
    fn unpack<R: Read + Seek>(r: &mut Reader<R>) -> Result<Self> {
        let offset = r.position();
        let tag = r.read_tag()?;
        match tag {
            Self::FOLDER_TAG => Ok(ChunkKind::Folder),
            Self::DATA_TAG => Ok(ChunkKind::Data),
            found => Err(Error::InvalidChunkType { offset, found }),
        }
    }

    fn pack(&self, w: &mut Writer) -> usize {
        w.write_tag(&self.tag());
        4
    }
}

/// Boxed stream a lazy chunk reads its payload from.
pub trait Source: Read + Seek {}

impl<T: Read + Seek> Source for T {}

/// Shared handle to the stream a lazily-read container came from.
///
/// Cloning shares the same underlying slot; [`SourceHandle::close`] drops
/// the stream, after which every unread lazy chunk fails with
/// [`Error::LazyDataUnavailable`] instead of returning garbage.
///
/// Lazy reads seek to the recorded offset, read, and restore the previous
/// stream position. The handle is `Rc`-based and therefore not `Send`:
/// a lazily-read container cannot be moved across threads, which is exactly
/// the sharing the format's seek-around reads cannot tolerate.
#[derive(Clone)]
pub struct SourceHandle {
    stream: Rc<RefCell<Option<Box<dyn Source>>>>,
}

impl SourceHandle {
    /// A handle with no stream attached yet. Created before parsing so lazy
    /// descriptors can reference it; the parsed-out stream is attached after.
    pub(crate) fn unattached() -> Self {
        Self {
            stream: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn attach(&self, stream: impl Source + 'static) {
        *self.stream.borrow_mut() = Some(Box::new(stream));
    }

    /// Drop the backing stream. Unread lazy chunks become permanently
    /// unavailable.
    pub fn close(&self) {
        self.stream.borrow_mut().take();
    }

    pub fn is_closed(&self) -> bool {
        self.stream.borrow().is_none()
    }

    /// Read exactly `size` bytes at `offset`, restoring the stream position
    /// afterwards.
    pub(crate) fn read_at(&self, offset: u64, size: u32) -> Result<Vec<u8>> {
        let mut slot = self.stream.borrow_mut();
        let stream = slot.as_mut().ok_or(Error::LazyDataUnavailable)?;

        let jump_back = stream.stream_position()?;
        stream.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        stream.seek(SeekFrom::Start(jump_back))?;

        if filled < buf.len() {
            return Err(Error::UnexpectedEof {
                offset: offset + filled as u64,
                need: buf.len(),
                have: filled,
            });
        }
        Ok(buf)
    }
}

impl fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Descriptor for payload bytes that haven't been read yet: where they live
/// in the backing stream, and how many there are.
#[derive(Debug, Clone)]
pub struct LazyRef {
    pub(crate) source: SourceHandle,
    pub offset: u64,
    pub size: u32,
}

impl LazyRef {
    pub fn read(&self) -> Result<Vec<u8>> {
        self.source.read_at(self.offset, self.size)
    }
}

/// A data chunk's payload: materialized bytes, or a pending descriptor into
/// the source stream.
#[derive(Debug, Clone)]
pub enum Payload {
    Loaded(Vec<u8>),
    Pending(LazyRef),
}

impl Payload {
    /// Declared payload length in bytes, whether or not it is materialized.
    pub fn len(&self) -> u32 {
        match self {
            Payload::Loaded(bytes) => bytes.len() as u32,
            Payload::Pending(lazy) => lazy.size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Payload::Loaded(_))
    }

    /// The payload bytes, reading through the descriptor if still pending.
    /// Does not cache; use [`Payload::load`] to materialize.
    pub fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Payload::Loaded(bytes) => Ok(Cow::Borrowed(bytes)),
            Payload::Pending(lazy) => Ok(Cow::Owned(lazy.read()?)),
        }
    }

    /// Materialize the payload. A pending descriptor is read once, cached,
    /// and its stream reference dropped; later mutation just replaces the
    /// cached bytes.
    pub fn load(&mut self) -> Result<&[u8]> {
        if let Payload::Pending(lazy) = &*self {
            let bytes = lazy.read()?;
            *self = Payload::Loaded(bytes);
        }
        match self {
            Payload::Loaded(bytes) => Ok(bytes),
            Payload::Pending(_) => unreachable!("pending payload survived load"),
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Loaded(a), Payload::Loaded(b)) => a == b,
            (Payload::Pending(a), Payload::Pending(b)) => {
                Rc::ptr_eq(&a.source.stream, &b.source.stream)
                    && a.offset == b.offset
                    && a.size == b.size
            }
            _ => false,
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Loaded(bytes)
    }
}

/// One node in the container tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub code: FourCC,
    pub name: String,
    /// Per-chunk version, present in layouts that store one (v3).
    pub version: Option<u32>,
    pub body: ChunkBody,
}

/// A chunk is either a folder of child chunks or opaque payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkBody {
    Folder(Vec<Chunk>),
    Data(Payload),
}

impl Chunk {
    pub fn folder(code: FourCC, name: impl Into<String>, children: Vec<Chunk>) -> Self {
        Self {
            code,
            name: name.into(),
            version: None,
            body: ChunkBody::Folder(children),
        }
    }

    pub fn data(code: FourCC, name: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            code,
            name: name.into(),
            version: None,
            body: ChunkBody::Data(payload.into()),
        }
    }

    pub fn kind(&self) -> ChunkKind {
        match self.body {
            ChunkBody::Folder(_) => ChunkKind::Folder,
            ChunkBody::Data(_) => ChunkKind::Data,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.body, ChunkBody::Folder(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self.body, ChunkBody::Data(_))
    }

    /// Child chunks; empty for data chunks.
    pub fn children(&self) -> &[Chunk] {
        match &self.body {
            ChunkBody::Folder(children) => children,
            ChunkBody::Data(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Chunk>> {
        match &mut self.body {
            ChunkBody::Folder(children) => Some(children),
            ChunkBody::Data(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.body {
            ChunkBody::Data(payload) => Some(payload),
            ChunkBody::Folder(_) => None,
        }
    }

    pub fn payload_mut(&mut self) -> Option<&mut Payload> {
        match &mut self.body {
            ChunkBody::Data(payload) => Some(payload),
            ChunkBody::Folder(_) => None,
        }
    }
}
