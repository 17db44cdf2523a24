//! Tilemap loading
//!
//! A map document is parsed, each referenced tileset is fetched through a
//! [`TilesetResolver`], and the layers are validated into an immutable
//! [`TileMap`]. Nothing is patched in place: a map transition loads a fresh
//! map and the old one is dropped once its last holder lets go.
//!
//! # Example
//!
//! ```rust,ignore
//! use rogue_map_runtime::{AssetLoader, DirectorySource, MapProvider};
//!
//! let mut loader = AssetLoader::new(DirectorySource::new("assets"));
//! let map = loader.load_map("billy_map")?;
//! ```

use crate::config::AssetsConfig;
use crate::registry::TilesetRegistry;
use crate::source::{resolve_relative, AssetSource};
use rogue_map_core::{format, LoadError, TileMap, TileMapBuilder, Tileset, TilesetSource};
use std::sync::Arc;

/// Fetches the tilesets a map document references
///
/// Implemented for closures, so tests and embedders can hand out tilesets
/// from anywhere.
pub trait TilesetResolver {
    /// `path` is already resolved against the map document's directory
    fn resolve_tileset(&mut self, path: &str) -> Result<Arc<Tileset>, LoadError>;
}

impl<F> TilesetResolver for F
where
    F: FnMut(&str) -> Result<Arc<Tileset>, LoadError>,
{
    fn resolve_tileset(&mut self, path: &str) -> Result<Arc<Tileset>, LoadError> {
        self(path)
    }
}

/// A registry reading cache misses from an [`AssetSource`]
pub struct RegistryResolver<'a, S: ?Sized> {
    pub registry: &'a mut TilesetRegistry,
    pub source: &'a S,
}

impl<S: AssetSource + ?Sized> TilesetResolver for RegistryResolver<'_, S> {
    fn resolve_tileset(&mut self, path: &str) -> Result<Arc<Tileset>, LoadError> {
        self.registry.load_from(self.source, path)
    }
}

/// Load a map document
///
/// `document_path` is where `text` was read from; relative tileset
/// references are resolved against its directory. `map_id` becomes the
/// map's identity for door links.
pub fn load_map<R: TilesetResolver + ?Sized>(
    map_id: &str,
    document_path: &str,
    text: &str,
    resolver: &mut R,
) -> Result<TileMap, LoadError> {
    let doc = format::parse_map(text)?;
    let mut builder = TileMapBuilder::new(map_id, doc.width, doc.height, doc.tile_width, doc.tile_height);

    for entry in doc.tilesets {
        match entry.source {
            TilesetSource::External(relative) => {
                let path = resolve_relative(document_path, &relative)?;
                let tileset = resolver.resolve_tileset(&path)?;
                builder.add_tileset(entry.first_gid, path, tileset)?;
            }
            TilesetSource::Inline(raw) => {
                let name = raw.name.clone();
                let tileset = Tileset::from_raw(raw).map_err(|source| LoadError::Tileset {
                    name: name.clone(),
                    source,
                })?;
                builder.add_tileset(entry.first_gid, name, Arc::new(tileset))?;
            }
        }
    }

    for layer in doc.layers {
        builder.add_layer(layer.name, layer.visible, &layer.gids)?;
    }

    let map = builder.build();
    tracing::debug!(
        map = %map.id,
        width = map.width(),
        height = map.height(),
        layers = map.layers().len(),
        tilesets = map.tilesets().count(),
        "loaded map"
    );
    Ok(map)
}

/// Supplies maps by id; what a door transition loads through
pub trait MapProvider {
    fn load_map(&mut self, map_id: &str) -> Result<TileMap, LoadError>;
}

impl<F> MapProvider for F
where
    F: FnMut(&str) -> Result<TileMap, LoadError>,
{
    fn load_map(&mut self, map_id: &str) -> Result<TileMap, LoadError> {
        self(map_id)
    }
}

/// Loads maps by id from an [`AssetSource`], sharing tilesets through a
/// [`TilesetRegistry`]
pub struct AssetLoader<S> {
    source: S,
    registry: TilesetRegistry,
    assets: AssetsConfig,
}

impl<S: AssetSource> AssetLoader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, AssetsConfig::default())
    }

    pub fn with_config(source: S, assets: AssetsConfig) -> Self {
        Self {
            source,
            registry: TilesetRegistry::new(),
            assets,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn registry(&self) -> &TilesetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TilesetRegistry {
        &mut self.registry
    }

    /// Load the map document at an explicit path
    pub fn load_document(&mut self, map_id: &str, path: &str) -> Result<TileMap, LoadError> {
        let text = self.source.read(path)?;
        let mut resolver = RegistryResolver {
            registry: &mut self.registry,
            source: &self.source,
        };
        load_map(map_id, path, &text, &mut resolver)
    }

    /// Find the document for a map id, trying each configured extension
    pub fn find_document(&self, map_id: &str) -> Result<(String, String), LoadError> {
        for path in self.assets.map_paths(map_id) {
            match self.source.read(&path) {
                Ok(text) => return Ok((path, text)),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(LoadError::MapNotFound(map_id.to_string()))
    }
}

impl<S: AssetSource> MapProvider for AssetLoader<S> {
    fn load_map(&mut self, map_id: &str) -> Result<TileMap, LoadError> {
        let (path, text) = self.find_document(map_id)?;
        let mut resolver = RegistryResolver {
            registry: &mut self.registry,
            source: &self.source,
        };
        load_map(map_id, &path, &text, &mut resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use rogue_map_core::LoadErrorKind;

    const SHEET: &str = r#"<tileset name="roguelikeSheet_transparent" tilewidth="16" tileheight="16" spacing="1" tilecount="1767" columns="57">
 <tile id="137"><properties><property name="collision" value="0.6,0,1,0.9"/></properties></tile>
 <tile id="330"><properties><property name="door" value="tavern_1a,0,0"/></properties></tile>
</tileset>"#;

    fn map_with(data: &str) -> String {
        format!(
            r#"<map orientation="orthogonal" width="3" height="2" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="../tiles/roguelikeSheet_transparent.tsx"/>
 <layer name="Tile Layer 1" width="3" height="2"><data encoding="csv">{data}</data></layer>
</map>"#
        )
    }

    fn assets(map: &str) -> MemorySource {
        MemorySource::new()
            .with("tiles/roguelikeSheet_transparent.tsx", SHEET)
            .with("maps/billy_map.tmx", map)
    }

    #[test]
    fn test_load_resolves_relative_tileset() {
        let mut loader = AssetLoader::with_config(
            assets(&map_with("1,138,0,0,331,0")),
            AssetsConfig {
                map_dir: "maps".to_string(),
                ..Default::default()
            },
        );
        let map = loader.load_map("billy_map").unwrap();
        assert_eq!(map.id, "billy_map");
        assert_eq!(map.tilesets().next().unwrap().source, "tiles/roguelikeSheet_transparent.tsx");
        assert_eq!(map.tile_at(0, 0, 1).unwrap().resolved.local_id, 137);
        assert!(loader.registry().contains("tiles/roguelikeSheet_transparent.tsx"));
    }

    #[test]
    fn test_unknown_gid_fails() {
        let mut loader = AssetLoader::new(assets(&map_with("1,5000,0,0,0,0")));
        let err = loader.load_document("billy_map", "maps/billy_map.tmx").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::UnknownTileset);
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let mut loader = AssetLoader::new(assets(&map_with("1,1,1,1,1")));
        let err = loader.load_document("billy_map", "maps/billy_map.tmx").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_missing_map() {
        let mut loader = AssetLoader::new(MemorySource::new());
        let err = loader.load_map("nowhere").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MapNotFound);
    }

    #[test]
    fn test_resolver_failure_is_propagated() {
        let mut failing = |path: &str| -> Result<Arc<Tileset>, LoadError> {
            Err(LoadError::Source {
                path: path.to_string(),
                message: "connection reset".to_string(),
            })
        };
        let err = load_map("billy_map", "maps/billy_map.tmx", &map_with("0,0,0,0,0,0"), &mut failing).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Source);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_inline_tileset() {
        let text = r#"<map width="2" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="props" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <tile id="2"><properties><property name="light" type="float" value="0.5"/></properties></tile>
 </tileset>
 <layer name="Props" width="2" height="1"><data encoding="csv">3,0</data></layer>
</map>"#;
        let mut none = |path: &str| -> Result<Arc<Tileset>, LoadError> {
            Err(LoadError::MapNotFound(path.to_string()))
        };
        let map = load_map("props_room", "props_room.tmx", text, &mut none).unwrap();
        let tile = map.tile_at(0, 0, 0).unwrap();
        assert_eq!(tile.definition().unwrap().light(), Some(0.5));
    }

    #[test]
    fn test_bad_inline_tileset_reports_its_name() {
        let text = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="props" tilewidth="16" tileheight="16" tilecount="4">
  <tile id="2"><properties><property name="door" value="tavern_1a"/></properties></tile>
 </tileset>
 <layer name="Props" width="1" height="1"><data encoding="csv">0</data></layer>
</map>"#;
        let mut none = |path: &str| -> Result<Arc<Tileset>, LoadError> {
            Err(LoadError::MapNotFound(path.to_string()))
        };
        let err = load_map("m", "m.tmx", text, &mut none).unwrap_err();
        assert!(matches!(err, LoadError::Tileset { ref name, .. } if name == "props"));
    }
}
