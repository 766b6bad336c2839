//! Reader/writer for Relic's Chunky container format.
//!
//! A Chunky file is a 16-byte magic word, a versioned header, and then a
//! recursive tree of tagged chunks: folders (`FOLD`) contain more chunks,
//! data chunks (`DATA`) hold opaque payload bytes. Three-layer architecture:
//!
//! - **Layer 1** (`cursor`): Raw little-endian stream I/O and the
//!   pack/unpack contract shared by every fixed-layout value
//! - **Layer 2** (`header`/`reader`/`writer`): The chunk tree codec —
//!   region-bounded recursive reads, two-pass size-patched writes
//! - **Layer 3** (`chunky`/`fs`): The parsed container, lazy payload
//!   access, and a path-addressable projection over the tree

pub mod chunk;
pub mod chunky;
pub mod cursor;
pub mod error;
pub mod fourcc;
pub mod fs;
pub mod header;
pub mod reader;
pub mod version;
pub mod writer;

pub use chunk::{Chunk, ChunkBody, ChunkKind, Payload, SourceHandle};
pub use chunky::Chunky;
pub use error::{Error, Result};
pub use fourcc::{FourCC, FourCCPath};
pub use reader::MAGIC;
pub use version::{Layout, Platform, Version};
