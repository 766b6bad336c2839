use std::io::{Read, Seek};

use crate::chunk::ChunkKind;
use crate::cursor::{Reader, StreamCodec, Writer};
use crate::error::{Error, Result};
use crate::fourcc::FourCC;
use crate::version::Layout;

/// One chunk's leading metadata, as stored on disk.
///
/// Field order is tag, fourcc, [per-chunk version,] name, size. The declared
/// size counts the bytes of the chunk's body only: payload bytes for data
/// chunks, the children's total serialized length for folders.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkHeader {
    pub kind: ChunkKind,
    pub code: FourCC,
    /// Per-chunk version, in layouts that store one (v3).
    pub version: Option<u32>,
    pub name: String,
    pub size: u32,
}

impl ChunkHeader {
    /// Read one header. `limit` is the absolute end of the enclosing region;
    /// a name that would cross it is rejected before being allocated.
    pub fn unpack<R: Read + Seek>(
        r: &mut Reader<R>,
        layout: &Layout,
        limit: u64,
    ) -> Result<Self> {
        let kind = ChunkKind::unpack(r)?;
        let code = FourCC::unpack(r)?;
        let version = if layout.chunk_version_field {
            Some(r.read_u32()?)
        } else {
            None
        };
        let name = Self::unpack_name(r, layout, limit)?;
        let size = r.read_u32()?;
        Ok(Self {
            kind,
            code,
            version,
            name,
            size,
        })
    }

    fn unpack_name<R: Read + Seek>(
        r: &mut Reader<R>,
        layout: &Layout,
        limit: u64,
    ) -> Result<String> {
        let len_offset = r.position();
        let len = r.read_u32()? as u64;
        if r.position() + len > limit {
            return Err(Error::Malformed {
                offset: len_offset,
                message: format!("name length {len} overruns the enclosing region"),
            });
        }

        let name_offset = r.position();
        let mut bytes = r.read_bytes(len as usize)?;
        if layout.name_nul_terminated {
            match bytes.pop() {
                Some(0) => {}
                _ => {
                    return Err(Error::Malformed {
                        offset: len_offset,
                        message: "name is not NUL-terminated".to_owned(),
                    })
                }
            }
        }
        if !bytes.is_ascii() {
            return Err(Error::InvalidName {
                offset: name_offset,
                found: bytes,
            });
        }
        // ASCII just checked.
        String::from_utf8(bytes).map_err(|e| Error::InvalidName {
            offset: name_offset,
            found: e.into_bytes(),
        })
    }

    /// Write the header with `self.size` as a placeholder, returning the
    /// buffer offset of the size field so the tree writer can backpatch it.
    pub fn pack(&self, w: &mut Writer, layout: &Layout) -> Result<usize> {
        if !self.name.is_ascii() {
            return Err(Error::InvalidName {
                offset: w.position() as u64,
                found: self.name.as_bytes().to_vec(),
            });
        }

        self.kind.pack(w);
        self.code.pack(w);
        if layout.chunk_version_field {
            w.write_u32(self.version.unwrap_or(0));
        }
        if layout.name_nul_terminated {
            w.write_u32(self.name.len() as u32 + 1);
            w.write_bytes(self.name.as_bytes());
            w.write_bytes(&[0]);
        } else {
            w.write_u32(self.name.len() as u32);
            w.write_bytes(self.name.as_bytes());
        }
        let size_field = w.position();
        w.write_u32(self.size);
        Ok(size_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(header: &ChunkHeader, layout: &Layout) -> ChunkHeader {
        let mut w = Writer::new();
        header.pack(&mut w, layout).unwrap();
        let bytes = w.into_bytes();
        let mut r = Reader::new(Cursor::new(bytes)).unwrap();
        let limit = r.len();
        ChunkHeader::unpack(&mut r, layout, limit).unwrap()
    }

    fn v1() -> &'static Layout {
        Layout::for_major(1).unwrap()
    }

    fn v3() -> &'static Layout {
        Layout::for_major(3).unwrap()
    }

    #[test]
    fn v1_header_roundtrip() {
        let header = ChunkHeader {
            kind: ChunkKind::Data,
            code: FourCC::new("DATA").unwrap(),
            version: None,
            name: "leaf".to_owned(),
            size: 5,
        };
        assert_eq!(roundtrip(&header, v1()), header);
    }

    #[test]
    fn v1_wire_layout() {
        let header = ChunkHeader {
            kind: ChunkKind::Folder,
            code: FourCC::new("TEST").unwrap(),
            version: None,
            name: String::new(),
            size: 0,
        };
        let mut w = Writer::new();
        let size_field = header.pack(&mut w, v1()).unwrap();
        assert_eq!(w.into_bytes(), b"FOLDTEST\x00\x00\x00\x00\x00\x00\x00\x00");
        assert_eq!(size_field, 12);
    }

    #[test]
    fn v3_header_carries_chunk_version_and_nul() {
        let header = ChunkHeader {
            kind: ChunkKind::Data,
            code: FourCC::new("FBIF").unwrap(),
            version: Some(2),
            name: "burn info".to_owned(),
            size: 16,
        };
        let mut w = Writer::new();
        header.pack(&mut w, v3()).unwrap();
        let bytes = w.into_bytes();
        // tag + cc + version + len + name + NUL + size
        assert_eq!(bytes.len(), 4 + 4 + 4 + 4 + 9 + 1 + 4);
        assert_eq!(&bytes[8..12], &2u32.to_le_bytes());
        assert_eq!(bytes[12 + 4 + 9], 0);
        assert_eq!(roundtrip(&header, v3()), header);
    }

    #[test]
    fn name_overrunning_region_is_rejected() {
        // Declares a 200-byte name inside a region that ends right after.
        let mut w = Writer::new();
        w.write_tag(b"DATA");
        w.write_tag(b"ABCD");
        w.write_u32(200);
        let bytes = w.into_bytes();
        let mut r = Reader::new(Cursor::new(bytes)).unwrap();
        let limit = r.len();
        assert!(matches!(
            ChunkHeader::unpack(&mut r, v1(), limit),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn non_ascii_name_is_rejected() {
        let mut w = Writer::new();
        w.write_tag(b"DATA");
        w.write_tag(b"ABCD");
        w.write_u32(2);
        w.write_bytes(&[0xff, 0xfe]);
        w.write_u32(0);
        let bytes = w.into_bytes();
        let mut r = Reader::new(Cursor::new(bytes)).unwrap();
        let limit = r.len();
        assert!(matches!(
            ChunkHeader::unpack(&mut r, v1(), limit),
            Err(Error::InvalidName { found, .. }) if found == vec![0xff, 0xfe]
        ));
    }
}
