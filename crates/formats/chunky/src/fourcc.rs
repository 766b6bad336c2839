use std::fmt;
use std::io::{Read, Seek};

use crate::cursor::{Reader, StreamCodec, Writer};
use crate::error::{Error, Result};

/// A chunk's 4-character type code (e.g. `MSGR`, `DATA`).
///
/// Always exactly four ASCII bytes; compares by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC([u8; 4]);

impl FourCC {
    /// Construct from a 4-character ASCII string.
    pub fn new(code: &str) -> Result<Self> {
        if code.len() != 4 || !code.is_ascii() {
            return Err(Error::InvalidFourCC {
                found: code.to_owned(),
            });
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(code.as_bytes());
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self.as_str())
    }
}

impl StreamCodec for FourCC {
    fn unpack<R: Read + Seek>(r: &mut Reader<R>) -> Result<Self> {
        let offset = r.position();
        let tag = r.read_tag()?;
        if !tag.is_ascii() {
            return Err(Error::InvalidName {
                offset,
                found: tag.to_vec(),
            });
        }
        Ok(Self(tag))
    }

    fn pack(&self, w: &mut Writer) -> usize {
        w.write_tag(&self.0);
        4
    }
}

/// The nesting path from the container root to a chunk, as a sequence of
/// fourccs (e.g. `MSGR.MSLC.DATA`).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct FourCCPath(Vec<FourCC>);

impl FourCCPath {
    /// The empty path (the container root).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(parts: impl IntoIterator<Item = FourCC>) -> Self {
        Self(parts.into_iter().collect())
    }

    pub fn parts(&self) -> &[FourCC] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend the path with a child code.
    pub fn child(&self, code: FourCC) -> Self {
        let mut parts = self.0.clone();
        parts.push(code);
        Self(parts)
    }

    /// Drop the last component. The root's parent is the root.
    pub fn parent(&self) -> Self {
        let mut parts = self.0.clone();
        parts.pop();
        Self(parts)
    }
}

impl fmt::Display for FourCCPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{cc}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCCPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCCPath({self})")
    }
}
