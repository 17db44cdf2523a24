//! Asset sources
//!
//! The engine never touches the filesystem directly: every tileset and map
//! document is read through an [`AssetSource`]. Paths are `/`-separated and
//! relative to the source root; `.` and `..` segments are normalized and a
//! path may never climb above the root.

use rogue_map_core::LoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to read a document from an [`AssetSource`]
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' escapes the asset root")]
    OutsideRoot(String),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }

    /// The path the failed read was for
    pub fn path(&self) -> &str {
        match self {
            SourceError::NotFound(path)
            | SourceError::Io { path, .. }
            | SourceError::OutsideRoot(path) => path,
        }
    }
}

impl From<SourceError> for LoadError {
    fn from(err: SourceError) -> Self {
        LoadError::Source {
            path: err.path().to_string(),
            message: err.to_string(),
        }
    }
}

/// Read access to tileset and map documents
pub trait AssetSource {
    /// Read a whole document as text
    fn read(&self, path: &str) -> Result<String, SourceError>;
}

impl<S: AssetSource + ?Sized> AssetSource for &S {
    fn read(&self, path: &str) -> Result<String, SourceError> {
        (**self).read(path)
    }
}

/// Normalize a relative asset path, resolving `.` and `..`
///
/// Returns `None` if the path climbs above the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Resolve `relative` against the directory of the document at `base`
///
/// `maps/a.tmx` + `../tiles/t.tsx` gives `tiles/t.tsx`.
pub fn resolve_relative(base: &str, relative: &str) -> Result<String, SourceError> {
    let dir = match base.rfind(['/', '\\']) {
        Some(i) => &base[..i],
        None => "",
    };
    let joined = if dir.is_empty() {
        relative.to_string()
    } else {
        format!("{dir}/{relative}")
    };
    normalize(&joined).ok_or(SourceError::OutsideRoot(joined))
}

/// Documents under a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectorySource {
    fn read(&self, path: &str) -> Result<String, SourceError> {
        let relative = normalize(path).ok_or_else(|| SourceError::OutsideRoot(path.to_string()))?;
        let full = self.root.join(&relative);
        std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(relative)
            } else {
                SourceError::Io {
                    path: relative,
                    source,
                }
            }
        })
    }
}

/// Documents held in memory, keyed by normalized path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemorySource::insert`]
    pub fn with(mut self, path: &str, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a document
    pub fn insert(&mut self, path: &str, contents: impl Into<String>) {
        let key = normalize(path).unwrap_or_else(|| path.to_string());
        self.documents.insert(key, contents.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.documents.remove(&normalize(path)?)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &str) -> Result<String, SourceError> {
        let key = normalize(path).ok_or_else(|| SourceError::OutsideRoot(path.to_string()))?;
        self.documents
            .get(&key)
            .cloned()
            .ok_or(SourceError::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rogue_map_core::LoadErrorKind;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("maps/./a.tmx").as_deref(), Some("maps/a.tmx"));
        assert_eq!(normalize("maps/../tiles/t.tsx").as_deref(), Some("tiles/t.tsx"));
        assert_eq!(normalize("maps\\b.tmx").as_deref(), Some("maps/b.tmx"));
        assert_eq!(normalize("../secret"), None);
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("maps/a.tmx", "../tiles/t.tsx").unwrap(), "tiles/t.tsx");
        assert_eq!(resolve_relative("a.tmx", "t.tsx").unwrap(), "t.tsx");
        assert_eq!(resolve_relative("maps/a.tmx", "t.tsx").unwrap(), "maps/t.tsx");
        assert!(matches!(
            resolve_relative("a.tmx", "../../t.tsx"),
            Err(SourceError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with("maps/../tiles/t.tsx", "<tileset/>");
        assert_eq!(source.read("tiles/t.tsx").unwrap(), "<tileset/>");
        assert_eq!(source.read("./tiles//t.tsx").unwrap(), "<tileset/>");
        assert!(source.read("tiles/missing.tsx").unwrap_err().is_not_found());
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("maps")).unwrap();
        std::fs::write(dir.path().join("maps/billy_map.tmx"), "<map/>").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.read("maps/billy_map.tmx").unwrap(), "<map/>");
        assert!(source.read("maps/none.tmx").unwrap_err().is_not_found());
        assert!(matches!(
            source.read("../outside.tmx"),
            Err(SourceError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_source_error_converts_to_load_error() {
        let err: LoadError = SourceError::NotFound("maps/x.tmx".to_string()).into();
        assert_eq!(err.kind(), LoadErrorKind::Source);
        assert!(err.to_string().contains("maps/x.tmx"));
    }
}
