use std::io::{Read, Seek};

use crate::chunk::{Chunk, ChunkBody, ChunkKind, LazyRef, Payload, SourceHandle};
use crate::cursor::Reader;
use crate::error::{Error, Result};
use crate::header::ChunkHeader;
use crate::version::Layout;

/// Magic word at the head of every Chunky stream. The `\r\n\x1a\0` tail
/// signals a properly transferred binary file.
pub const MAGIC: [u8; 16] = *b"Relic Chunky\r\n\x1a\0";

/// Check the magic word at the reader's current position.
///
/// On mismatch the stream position is unspecified; the error carries both
/// the expected and the found bytes (zero-padded if the stream was shorter
/// than the magic itself).
pub(crate) fn read_magic<R: Read + Seek>(r: &mut Reader<R>) -> Result<()> {
    let mut found = [0u8; 16];
    r.read_up_to(&mut found)?;
    if found != MAGIC {
        return Err(Error::MagicMismatch {
            expected: &MAGIC,
            found,
        });
    }
    Ok(())
}

/// Read sibling chunks until the region ending at absolute offset `end` is
/// exactly consumed.
///
/// Folders recurse into a sub-region of exactly their declared size. Data
/// payloads are read eagerly, or recorded as lazy descriptors against
/// `source` and skipped. Any header or body that would cross `end` is a
/// structural error; no partial tree is ever returned.
pub(crate) fn read_chunk_list<R: Read + Seek>(
    r: &mut Reader<R>,
    end: u64,
    layout: &Layout,
    source: Option<&SourceHandle>,
) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    while r.position() < end {
        let header_offset = r.position();
        let header = ChunkHeader::unpack(r, layout, end)?;
        if r.position() > end {
            return Err(Error::Malformed {
                offset: header_offset,
                message: "chunk header crosses the region boundary".to_owned(),
            });
        }

        let body_end = r.position() + header.size as u64;
        if body_end > end {
            return Err(Error::Malformed {
                offset: header_offset,
                message: format!(
                    "declared size {} overruns the region ending at {:#x}",
                    header.size, end
                ),
            });
        }

        let body = match header.kind {
            ChunkKind::Folder => {
                ChunkBody::Folder(read_chunk_list(r, body_end, layout, source)?)
            }
            ChunkKind::Data => match source {
                Some(source) => {
                    let offset = r.position();
                    r.seek(body_end)?;
                    ChunkBody::Data(Payload::Pending(LazyRef {
                        source: source.clone(),
                        offset,
                        size: header.size,
                    }))
                }
                None => ChunkBody::Data(Payload::Loaded(
                    r.read_bytes(header.size as usize)?,
                )),
            },
        };

        chunks.push(Chunk {
            code: header.code,
            name: header.name,
            version: header.version,
            body,
        });
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn magic_matches() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        let mut r = Reader::new(Cursor::new(data)).unwrap();
        read_magic(&mut r).unwrap();
        assert_eq!(r.position(), 16);
    }

    #[test]
    fn magic_mismatch_reports_found_bytes() {
        let mut r = Reader::new(Cursor::new(b"Relic Chonky\r\n\x1a\0rest".to_vec())).unwrap();
        match read_magic(&mut r) {
            Err(Error::MagicMismatch { found, .. }) => {
                assert_eq!(&found, b"Relic Chonky\r\n\x1a\0");
            }
            other => panic!("expected magic mismatch, got {other:?}"),
        }
    }

    #[test]
    fn magic_mismatch_on_short_stream() {
        let mut r = Reader::new(Cursor::new(b"Relic".to_vec())).unwrap();
        assert!(matches!(
            read_magic(&mut r),
            Err(Error::MagicMismatch { .. })
        ));
    }
}
