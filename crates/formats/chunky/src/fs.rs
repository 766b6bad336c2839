//! Path-addressable projection over a parsed container.
//!
//! Each path component is a chunk's display name (its header name, or its
//! fourcc when the name is empty). The container format permits duplicate
//! sibling names; the projection suffixes duplicates (`name~1`, `name~2`,
//! ...) so every entry stays uniquely addressable. Disambiguation happens
//! here only — the underlying tree keeps duplicates verbatim, and mounting
//! then unmounting round-trips through the container codec unchanged.

use crate::chunk::{Chunk, ChunkBody, ChunkKind, Payload};
use crate::chunky::Chunky;
use crate::error::{Error, Result};
use crate::fourcc::FourCC;

/// Metadata for one projected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Disambiguated entry name (unique among its siblings).
    pub name: String,
    pub code: FourCC,
    pub kind: ChunkKind,
    /// Payload size in bytes; 0 for folders.
    pub size: u32,
    pub version: Option<u32>,
}

/// A mounted container.
pub struct ChunkyFs {
    inner: Chunky,
}

impl ChunkyFs {
    pub fn mount(chunky: Chunky) -> Self {
        Self { inner: chunky }
    }

    /// Unmount, returning the (possibly edited) container.
    pub fn into_inner(self) -> Chunky {
        self.inner
    }

    pub fn chunky(&self) -> &Chunky {
        &self.inner
    }

    /// List the entries of a folder (`""` or `"/"` for the root).
    pub fn list(&self, path: &str) -> Result<Vec<EntryInfo>> {
        let children = match self.resolve(path)? {
            Some(chunk) if chunk.is_folder() => chunk.children(),
            Some(_) => {
                return Err(Error::NotAFolder {
                    path: path.to_owned(),
                })
            }
            None => self.inner.chunks.as_slice(),
        };
        let names = sibling_names(children);
        Ok(children
            .iter()
            .zip(names)
            .map(|(chunk, name)| entry_info(chunk, name))
            .collect())
    }

    /// Metadata for the entry at `path`.
    pub fn metadata(&self, path: &str) -> Result<EntryInfo> {
        let (parent, last) = self.resolve_parent(path)?;
        let names = sibling_names(parent);
        let index = names
            .iter()
            .position(|n| n == last)
            .ok_or_else(|| Error::PathNotFound {
                path: path.to_owned(),
            })?;
        Ok(entry_info(&parent[index], names[index].clone()))
    }

    /// Read a data chunk's payload.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        match self.resolve(path)? {
            Some(chunk) => match chunk.payload() {
                Some(payload) => Ok(payload.read()?.into_owned()),
                None => Err(Error::NotADataChunk {
                    path: path.to_owned(),
                }),
            },
            None => Err(Error::NotADataChunk {
                path: path.to_owned(),
            }),
        }
    }

    /// Replace a data chunk's payload with new bytes. A pending lazy
    /// descriptor is discarded in favor of the given bytes.
    pub fn write(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        let chunk = self.resolve_mut(path)?;
        match chunk.payload_mut() {
            Some(payload) => {
                *payload = Payload::Loaded(data);
                Ok(())
            }
            None => Err(Error::NotADataChunk {
                path: path.to_owned(),
            }),
        }
    }

    /// Rename the chunk at `path` (the raw header name, not the projected
    /// one; projected names re-disambiguate on the next listing).
    pub fn set_name(&mut self, path: &str, name: impl Into<String>) -> Result<()> {
        self.resolve_mut(path)?.name = name.into();
        Ok(())
    }

    /// Resolve a path to its chunk; `Ok(None)` is the root itself.
    fn resolve(&self, path: &str) -> Result<Option<&Chunk>> {
        let mut current: Option<&Chunk> = None;
        for part in components(path) {
            let children = match current {
                Some(chunk) => chunk.children(),
                None => self.inner.chunks.as_slice(),
            };
            current = Some(lookup(children, part).ok_or_else(|| Error::PathNotFound {
                path: path.to_owned(),
            })?);
        }
        Ok(current)
    }

    /// Resolve a path to its parent's child list plus the final component.
    fn resolve_parent<'a, 'p>(&'a self, path: &'p str) -> Result<(&'a [Chunk], &'p str)> {
        let parts: Vec<&str> = components(path).collect();
        let Some((last, dirs)) = parts.split_last() else {
            return Err(Error::PathNotFound {
                path: path.to_owned(),
            });
        };
        let mut children: &[Chunk] = &self.inner.chunks;
        for part in dirs {
            let chunk = lookup(children, part).ok_or_else(|| Error::PathNotFound {
                path: path.to_owned(),
            })?;
            children = chunk.children();
        }
        Ok((children, last))
    }

    fn resolve_mut(&mut self, path: &str) -> Result<&mut Chunk> {
        let route = self.route(path)?;
        let (&first, rest) = route.split_first().ok_or_else(|| Error::PathNotFound {
            path: path.to_owned(),
        })?;
        descend_mut(&mut self.inner.chunks[first], rest).ok_or_else(|| Error::PathNotFound {
            path: path.to_owned(),
        })
    }

    /// Child-index route from the root to the entry at `path`.
    fn route(&self, path: &str) -> Result<Vec<usize>> {
        let mut route = Vec::new();
        let mut children: &[Chunk] = &self.inner.chunks;
        for part in components(path) {
            let names = sibling_names(children);
            let index = names.iter().position(|n| n == part).ok_or_else(|| {
                Error::PathNotFound {
                    path: path.to_owned(),
                }
            })?;
            route.push(index);
            children = children[index].children();
        }
        Ok(route)
    }
}

fn descend_mut<'a>(chunk: &'a mut Chunk, route: &[usize]) -> Option<&'a mut Chunk> {
    match route.split_first() {
        None => Some(chunk),
        Some((&i, rest)) => descend_mut(chunk.children_mut()?.get_mut(i)?, rest),
    }
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|p| !p.is_empty())
}

fn lookup<'a>(children: &'a [Chunk], name: &str) -> Option<&'a Chunk> {
    let names = sibling_names(children);
    let index = names.iter().position(|n| n == name)?;
    Some(&children[index])
}

fn entry_info(chunk: &Chunk, name: String) -> EntryInfo {
    EntryInfo {
        name,
        code: chunk.code,
        kind: chunk.kind(),
        size: match &chunk.body {
            ChunkBody::Data(payload) => payload.len(),
            ChunkBody::Folder(_) => 0,
        },
        version: chunk.version,
    }
}

/// Display name for a chunk: its header name, or its fourcc when unnamed.
/// Path separators inside names are flattened so they can't split a path.
fn display_name(chunk: &Chunk) -> String {
    let trimmed = chunk.name.trim();
    let base = if trimmed.is_empty() {
        chunk.code.as_str()
    } else {
        trimmed
    };
    base.replace(['/', '\\'], "_")
}

/// Unique names for a sibling list: duplicates get `~1`, `~2`, ... suffixes
/// in document order.
fn sibling_names(children: &[Chunk]) -> Vec<String> {
    let mut names = Vec::with_capacity(children.len());
    for (i, chunk) in children.iter().enumerate() {
        let base = display_name(chunk);
        let dup = children[..i]
            .iter()
            .filter(|c| display_name(c) == base)
            .count();
        if dup == 0 {
            names.push(base);
        } else {
            names.push(format!("{base}~{dup}"));
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn cc(s: &str) -> FourCC {
        FourCC::new(s).unwrap()
    }

    fn mounted() -> ChunkyFs {
        let mut chunky = Chunky::new(Version::V1);
        chunky.chunks = vec![Chunk::folder(
            cc("TEST"),
            "suite",
            vec![
                Chunk::data(cc("DATA"), "leaf", b"hello".to_vec()),
                Chunk::data(cc("DATA"), "leaf", b"world".to_vec()),
                Chunk::data(cc("DATA"), "", b"unnamed".to_vec()),
            ],
        )];
        ChunkyFs::mount(chunky)
    }

    #[test]
    fn duplicate_sibling_names_are_suffixed() {
        let fs = mounted();
        let names: Vec<String> = fs
            .list("suite")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["leaf", "leaf~1", "DATA"]);
    }

    #[test]
    fn read_through_disambiguated_paths() {
        let fs = mounted();
        assert_eq!(fs.read("suite/leaf").unwrap(), b"hello");
        assert_eq!(fs.read("/suite/leaf~1").unwrap(), b"world");
        assert_eq!(fs.read("suite/DATA").unwrap(), b"unnamed");
        assert!(matches!(
            fs.read("suite/missing"),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn write_replaces_payload() {
        let mut fs = mounted();
        fs.write("suite/leaf", b"patched".to_vec()).unwrap();
        assert_eq!(fs.read("suite/leaf").unwrap(), b"patched");

        // The edit lands in the underlying tree, not just the projection.
        let chunky = fs.into_inner();
        let payload = chunky.chunks[0].children()[0].payload().unwrap();
        assert_eq!(payload.read().unwrap().as_ref(), b"patched");
    }

    #[test]
    fn metadata_reports_kind_and_size() {
        let fs = mounted();
        let info = fs.metadata("suite/leaf").unwrap();
        assert_eq!(info.kind, ChunkKind::Data);
        assert_eq!(info.size, 5);
        assert_eq!(info.code, cc("DATA"));

        let info = fs.metadata("suite").unwrap();
        assert_eq!(info.kind, ChunkKind::Folder);
    }

    #[test]
    fn rename_changes_projection() {
        let mut fs = mounted();
        fs.set_name("suite/leaf~1", "other").unwrap();
        assert_eq!(fs.read("suite/other").unwrap(), b"world");
        assert_eq!(fs.read("suite/leaf").unwrap(), b"hello");
        assert!(matches!(
            fs.read("suite/leaf~1"),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn mount_roundtrip_preserves_duplicates() {
        let fs = mounted();
        let bytes = fs.chunky().to_bytes().unwrap();
        let reread = Chunky::read_bytes(&bytes).unwrap();
        let names: Vec<&str> = reread.chunks[0]
            .children()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["leaf", "leaf", ""]);
    }
}
