use std::io::{Read, Seek, Write};

use crate::chunk::{Chunk, Source, SourceHandle};
use crate::cursor::{Reader, StreamCodec, Writer};
use crate::error::Result;
use crate::fourcc::FourCCPath;
use crate::reader::{read_chunk_list, read_magic, MAGIC};
use crate::version::{Layout, Platform, Version};
use crate::writer::write_chunk_list;

/// A parsed (or programmatically built) Chunky container: the header
/// metadata plus the ordered tree of top-level chunks.
///
/// Chunks are kept in document order in a single list — required for
/// byte-exact round-trips; [`Chunky::folders`] and [`Chunky::data_chunks`]
/// give the filtered views.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunky {
    pub version: Version,
    pub platform: Platform,
    pub chunks: Vec<Chunk>,
}

impl Chunky {
    /// An empty container for the given version.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            platform: Platform::Pc,
            chunks: Vec::new(),
        }
    }

    /// Parse a container, materializing every data payload.
    pub fn read<R: Read + Seek>(stream: R) -> Result<Self> {
        let mut r = Reader::new(stream)?;
        Self::read_inner(&mut r, None)
    }

    /// Parse a container from an in-memory byte image.
    pub fn read_bytes(data: &[u8]) -> Result<Self> {
        Self::read(std::io::Cursor::new(data))
    }

    /// Parse a container without reading data payloads; each data chunk
    /// records an offset/length descriptor into the stream instead.
    ///
    /// The stream is moved into the returned [`SourceHandle`]; payloads read
    /// through it on first access. [`SourceHandle::close`] drops the stream,
    /// after which unread payloads fail explicitly. If parsing fails the
    /// stream is dropped before returning, so a partially-read stream is
    /// never left open.
    pub fn read_lazy<R: Source + 'static>(stream: R) -> Result<(Self, SourceHandle)> {
        let handle = SourceHandle::unattached();
        let mut r = Reader::new(stream)?;
        let chunky = Self::read_inner(&mut r, Some(&handle))?;
        handle.attach(r.into_inner());
        Ok((chunky, handle))
    }

    fn read_inner<R: Read + Seek>(
        r: &mut Reader<R>,
        source: Option<&SourceHandle>,
    ) -> Result<Self> {
        read_magic(r)?;
        let major = r.read_u32()?;
        let layout = Layout::for_major(major)?;
        let minor = if layout.two_part_version {
            r.read_u32()?
        } else {
            1
        };
        let version = Version::new(major, minor);
        let platform = if layout.has_platform {
            Platform::unpack(r)?
        } else {
            Platform::default()
        };
        let end = r.len();
        let chunks = read_chunk_list(r, end, layout, source)?;
        Ok(Self {
            version,
            platform,
            chunks,
        })
    }

    /// Serialize to an in-memory byte image.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let layout = Layout::for_version(self.version)?;
        let mut w = Writer::with_capacity(64);
        w.write_bytes(&MAGIC);
        w.write_u32(self.version.major);
        if layout.two_part_version {
            w.write_u32(self.version.minor);
        }
        if layout.has_platform {
            self.platform.pack(&mut w);
        }
        write_chunk_list(&mut w, &self.chunks, layout)?;
        Ok(w.into_bytes())
    }

    /// Serialize to a byte sink, returning the total bytes written.
    pub fn write<W: Write>(&self, mut sink: W) -> Result<u64> {
        let bytes = self.to_bytes()?;
        sink.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    /// Top-level folder chunks, in document order.
    pub fn folders(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(|c| c.is_folder())
    }

    /// Top-level data chunks, in document order.
    pub fn data_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(|c| c.is_data())
    }

    /// Walk the whole tree in document order, yielding each chunk with its
    /// full fourcc path from the root.
    pub fn walk(&self) -> Walk<'_> {
        let mut stack: Vec<(FourCCPath, &Chunk)> = Vec::new();
        let root = FourCCPath::root();
        for chunk in self.chunks.iter().rev() {
            stack.push((root.child(chunk.code), chunk));
        }
        Walk { stack }
    }

    /// The first chunk whose full fourcc path matches, in document order.
    pub fn at(&self, path: &FourCCPath) -> Option<&Chunk> {
        self.walk()
            .find(|(p, _)| p == path)
            .map(|(_, chunk)| chunk)
    }
}

/// Document-order (pre-order) traversal over a container's chunk tree.
pub struct Walk<'a> {
    stack: Vec<(FourCCPath, &'a Chunk)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (FourCCPath, &'a Chunk);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, chunk) = self.stack.pop()?;
        for child in chunk.children().iter().rev() {
            self.stack.push((path.child(child.code), child));
        }
        Some((path, chunk))
    }
}
