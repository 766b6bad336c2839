use std::fmt;
use std::io::{Read, Seek};

use crate::cursor::{Reader, StreamCodec, Writer};
use crate::error::{Error, Result};

/// A Chunky container version.
///
/// Orders by major, then minor. Observed minors are always 1; v1 files
/// don't store a minor at all and imply 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const V1: Self = Self::new(1, 1);
    pub const V3: Self = Self::new(3, 1);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Platform code carried by v3 container headers.
///
/// A closed set; only PC files have ever been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    Pc,
}

impl Platform {
    const ALLOWED: &'static [u32] = &[1];

    pub fn code(self) -> u32 {
        match self {
            Platform::Pc => 1,
        }
    }

    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(Platform::Pc),
            other => Err(Error::UnknownPlatform {
                found: other,
                allowed: Self::ALLOWED,
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Pc => f.write_str("PC"),
        }
    }
}

impl StreamCodec for Platform {
    fn unpack<R: Read + Seek>(r: &mut Reader<R>) -> Result<Self> {
        Self::from_code(r.read_u32()?)
    }

    fn pack(&self, w: &mut Writer) -> usize {
        w.write_u32(self.code());
        4
    }
}

/// On-disk layout rules for one container version.
///
/// Resolved from the major version immediately after it is read, before any
/// further bytes are interpreted; everything downstream branches on these
/// flags instead of re-inspecting the version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub version: Version,
    /// The container version field is (major, minor) rather than major-only.
    pub two_part_version: bool,
    /// The container header carries a platform code after the version.
    pub has_platform: bool,
    /// Chunk headers carry a per-chunk version u32 after the fourcc.
    pub chunk_version_field: bool,
    /// Name lengths include a trailing NUL byte, stripped on read.
    pub name_nul_terminated: bool,
}

/// Human-readable description of the supported version set, for errors.
pub(crate) const SUPPORTED_VERSIONS: &str = "1.x, 3.x";

static LAYOUTS: [Layout; 2] = [
    Layout {
        version: Version::V1,
        two_part_version: false,
        has_platform: false,
        chunk_version_field: false,
        name_nul_terminated: false,
    },
    Layout {
        version: Version::V3,
        two_part_version: true,
        has_platform: true,
        chunk_version_field: true,
        name_nul_terminated: true,
    },
];

impl Layout {
    /// Look up the layout for a major version number.
    pub fn for_major(major: u32) -> Result<&'static Layout> {
        LAYOUTS
            .iter()
            .find(|l| l.version.major == major)
            .ok_or(Error::UnsupportedVersion {
                found: Version::new(major, 1),
                supported: SUPPORTED_VERSIONS,
            })
    }

    /// Look up the layout for a full version value.
    pub fn for_version(version: Version) -> Result<&'static Layout> {
        Self::for_major(version.major)
    }

    /// All registered layouts, in version order.
    pub fn registered() -> &'static [Layout] {
        &LAYOUTS
    }
}
