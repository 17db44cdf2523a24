//! Tileset registry
//!
//! Tilesets are parsed once and shared: every map that references the same
//! tileset document receives the same `Arc<Tileset>`. The cache is never
//! evicted implicitly; call [`TilesetRegistry::clear`] to drop it.

use crate::source::{normalize, AssetSource};
use rogue_map_core::{format, LoadError, ParseError, Tileset};
use std::collections::HashMap;
use std::sync::Arc;

/// Cache of parsed tilesets keyed by the path maps reference them by
#[derive(Debug, Default)]
pub struct TilesetRegistry {
    tilesets: HashMap<String, Arc<Tileset>>,
}

impl TilesetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str) -> String {
        normalize(path).unwrap_or_else(|| path.to_string())
    }

    /// Parse `text` as the tileset `key`, or return the cached instance
    ///
    /// On a cache hit `text` is not looked at.
    pub fn load(&mut self, key: &str, text: &str) -> Result<Arc<Tileset>, ParseError> {
        let key = Self::key(key);
        if let Some(tileset) = self.tilesets.get(&key) {
            tracing::trace!(%key, "tileset cache hit");
            return Ok(Arc::clone(tileset));
        }
        let tileset = Arc::new(format::parse_tileset(text)?);
        tracing::debug!(%key, name = %tileset.name, "registered tileset");
        self.tilesets.insert(key, Arc::clone(&tileset));
        Ok(tileset)
    }

    /// Fetch the tileset at `path` from `source`, reading it only on a cache
    /// miss
    pub fn load_from<S: AssetSource + ?Sized>(&mut self, source: &S, path: &str) -> Result<Arc<Tileset>, LoadError> {
        if let Some(tileset) = self.get(path) {
            tracing::trace!(path, "tileset cache hit");
            return Ok(tileset);
        }
        let text = source.read(path)?;
        self.load(path, &text).map_err(|err| LoadError::Tileset {
            name: path.to_string(),
            source: err,
        })
    }

    /// Register an already built tileset under `key`, replacing any cached one
    pub fn insert(&mut self, key: &str, tileset: Tileset) -> Arc<Tileset> {
        let tileset = Arc::new(tileset);
        self.tilesets.insert(Self::key(key), Arc::clone(&tileset));
        tileset
    }

    pub fn get(&self, key: &str) -> Option<Arc<Tileset>> {
        self.tilesets.get(&Self::key(key)).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tilesets.contains_key(&Self::key(key))
    }

    /// Cached keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tilesets.keys().map(String::as_str)
    }

    /// Get the number of cached tilesets
    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    /// Drop every cached tileset; maps already loaded keep their own `Arc`s
    pub fn clear(&mut self) {
        self.tilesets.clear();
    }
}
