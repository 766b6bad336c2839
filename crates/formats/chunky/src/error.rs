use thiserror::Error;

use crate::version::Version;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not a Relic Chunky stream: expected magic {expected:?}, found {found:?}")]
    MagicMismatch {
        expected: &'static [u8; 16],
        found: [u8; 16],
    },

    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("malformed chunk at offset {offset:#x}: {message}")]
    Malformed { offset: u64, message: String },

    #[error("chunk type at offset {offset:#x} must be \"FOLD\" or \"DATA\"; got {found:?}")]
    InvalidChunkType { offset: u64, found: [u8; 4] },

    #[error("chunk name at offset {offset:#x} is not parsable ascii text: {found:?}")]
    InvalidName { offset: u64, found: Vec<u8> },

    #[error("fourcc must be exactly 4 ascii characters; got {found:?}")]
    InvalidFourCC { found: String },

    #[error("chunky version {found} is not supported (supported: {supported})")]
    UnsupportedVersion {
        found: Version,
        supported: &'static str,
    },

    #[error("platform code {found} is not recognized (known codes: {allowed:?})")]
    UnknownPlatform {
        found: u32,
        allowed: &'static [u32],
    },

    #[error("lazy chunk data is unavailable: the backing stream was closed")]
    LazyDataUnavailable,

    #[error("no entry at path {path:?}")]
    PathNotFound { path: String },

    #[error("entry at path {path:?} is not a data chunk")]
    NotADataChunk { path: String },

    #[error("entry at path {path:?} is not a folder")]
    NotAFolder { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
