use crate::chunk::{Chunk, ChunkBody};
use crate::cursor::Writer;
use crate::error::Result;
use crate::header::ChunkHeader;
use crate::version::Layout;

/// Write sibling chunks in document order, returning the number of bytes
/// written.
pub(crate) fn write_chunk_list(w: &mut Writer, chunks: &[Chunk], layout: &Layout) -> Result<u32> {
    let start = w.position();
    for chunk in chunks {
        write_chunk(w, chunk, layout)?;
    }
    Ok((w.position() - start) as u32)
}

/// Write one chunk: header with a placeholder size, then the body, then
/// backpatch the size field with the measured body length.
///
/// The same two-pass discipline applies at every nesting depth, so a
/// folder's size field is always the exact serialized length of its
/// children and a reader can trust it without scanning for a terminator.
fn write_chunk(w: &mut Writer, chunk: &Chunk, layout: &Layout) -> Result<()> {
    let header = ChunkHeader {
        kind: chunk.kind(),
        code: chunk.code,
        version: chunk.version,
        name: chunk.name.clone(),
        size: 0,
    };
    let size_field = header.pack(w, layout)?;

    let body_start = w.position();
    match &chunk.body {
        ChunkBody::Folder(children) => {
            write_chunk_list(w, children, layout)?;
        }
        ChunkBody::Data(payload) => {
            w.write_bytes(&payload.read()?);
        }
    }

    let size = (w.position() - body_start) as u32;
    w.patch_u32(size_field, size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkKind;
    use crate::cursor::Reader;
    use crate::fourcc::FourCC;
    use crate::reader::read_chunk_list;
    use std::io::Cursor;

    fn cc(s: &str) -> FourCC {
        FourCC::new(s).unwrap()
    }

    #[test]
    fn folder_size_is_patched_to_child_length() {
        let layout = Layout::for_major(1).unwrap();
        let tree = vec![Chunk::folder(
            cc("TEST"),
            "",
            vec![Chunk::data(cc("DATA"), "leaf", b"hello".to_vec())],
        )];

        let mut w = Writer::new();
        let written = write_chunk_list(&mut w, &tree, layout).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(written as usize, bytes.len());

        // Folder header: FOLD + TEST + name len 0 + size.
        let size = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        // Child: DATA + DATA + len 4 + "leaf" + size + 5 payload bytes.
        assert_eq!(size, 25);

        let mut r = Reader::new(Cursor::new(bytes)).unwrap();
        let end = r.len();
        let reread = read_chunk_list(&mut r, end, layout, None).unwrap();
        assert_eq!(reread, tree);
    }

    #[test]
    fn empty_folder_writes_zero_size() {
        let layout = Layout::for_major(1).unwrap();
        let tree = vec![Chunk::folder(cc("FBIF"), "", Vec::new())];

        let mut w = Writer::new();
        write_chunk_list(&mut w, &tree, layout).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);

        let mut r = Reader::new(Cursor::new(bytes)).unwrap();
        let end = r.len();
        let reread = read_chunk_list(&mut r, end, layout, None).unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread[0].kind(), ChunkKind::Folder);
        assert!(reread[0].children().is_empty());
    }
}
