//! Tilesets and per-tile definitions

use crate::collision::CollisionBox;
use crate::error::ParseError;
use crate::property::{DoorRef, TileProperty};
use crate::value::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata declared for one tile id
///
/// Holds at most one collision box and at most one light; any number of
/// door links and unknown properties, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: u32,
    properties: Vec<TileProperty>,
}

impl TileDefinition {
    /// Build a definition from classified properties, enforcing the
    /// one-collision / one-light rule
    pub fn new(id: u32, properties: Vec<TileProperty>) -> Result<Self, ParseError> {
        let mut seen_collision = false;
        let mut seen_light = false;
        for prop in &properties {
            let seen = match prop {
                TileProperty::Collision(_) => &mut seen_collision,
                TileProperty::Light { .. } => &mut seen_light,
                _ => continue,
            };
            if *seen {
                return Err(ParseError::DuplicateProperty {
                    tile_id: id,
                    property: prop.name().to_string(),
                });
            }
            *seen = true;
        }
        Ok(Self { id, properties })
    }

    pub fn properties(&self) -> &[TileProperty] {
        &self.properties
    }

    /// The declared collision box, if the tile blocks movement
    pub fn collision(&self) -> Option<CollisionBox> {
        self.properties.iter().find_map(|p| match p {
            TileProperty::Collision(b) => Some(*b),
            _ => None,
        })
    }

    /// The declared light intensity, if the tile emits light
    pub fn light(&self) -> Option<f32> {
        self.properties.iter().find_map(|p| match p {
            TileProperty::Light { intensity } => Some(*intensity),
            _ => None,
        })
    }

    /// The first declared door link
    pub fn door(&self) -> Option<&DoorRef> {
        self.doors().next()
    }

    /// Every declared door link, in declaration order
    pub fn doors(&self) -> impl Iterator<Item = &DoorRef> {
        self.properties.iter().filter_map(|p| match p {
            TileProperty::Door(d) => Some(d),
            _ => None,
        })
    }

    /// Look up an unrecognized property by name
    pub fn unknown(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find_map(|p| match p {
            TileProperty::Unknown { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }
}

/// The atlas image a tileset was cut from (opaque to the engine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilesetImage {
    /// Path as written in the tileset document
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// One tile entry as read from a document, before validation
#[derive(Debug, Clone, Default)]
pub struct RawTile {
    pub id: u32,
    pub properties: Vec<(String, PropertyValue)>,
}

/// A tileset document as read from disk, before validation
#[derive(Debug, Clone, Default)]
pub struct RawTileset {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub image: Option<TilesetImage>,
    pub tiles: Vec<RawTile>,
}

/// A validated, immutable tileset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub name: String,
    /// Tile size in pixels
    pub tile_width: u32,
    pub tile_height: u32,
    /// Pixels between tiles in the atlas
    pub spacing: u32,
    /// Pixels around the atlas border
    pub margin: u32,
    /// Number of tiles; valid ids are `0..tile_count`
    pub tile_count: u32,
    pub columns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TilesetImage>,
    /// Only tiles that declare properties are stored
    tiles: BTreeMap<u32, TileDefinition>,
}

impl Tileset {
    /// Create an empty tileset
    pub fn new(name: impl Into<String>, tile_width: u32, tile_height: u32, tile_count: u32) -> Self {
        Self {
            name: name.into(),
            tile_width,
            tile_height,
            spacing: 0,
            margin: 0,
            tile_count,
            columns: 0,
            image: None,
            tiles: BTreeMap::new(),
        }
    }

    /// Validate a raw document into a tileset
    ///
    /// Any invalid tile rejects the whole tileset.
    pub fn from_raw(raw: RawTileset) -> Result<Self, ParseError> {
        let mut tileset = Tileset {
            name: raw.name,
            tile_width: raw.tile_width,
            tile_height: raw.tile_height,
            spacing: raw.spacing,
            margin: raw.margin,
            tile_count: raw.tile_count,
            columns: raw.columns,
            image: raw.image,
            tiles: BTreeMap::new(),
        };

        for raw_tile in raw.tiles {
            if raw_tile.properties.is_empty() {
                continue;
            }
            let id = raw_tile.id;
            let properties = raw_tile
                .properties
                .into_iter()
                .map(|(name, value)| TileProperty::classify(id, &name, value))
                .collect::<Result<Vec<_>, _>>()?;
            tileset.insert(TileDefinition::new(id, properties)?)?;
        }

        Ok(tileset)
    }

    /// Add a tile definition
    ///
    /// Fails if the id is outside the tileset, or if the id was already
    /// defined and the merged properties repeat a collision or light.
    pub fn insert(&mut self, definition: TileDefinition) -> Result<(), ParseError> {
        if definition.id >= self.tile_count {
            return Err(ParseError::TileOutOfRange {
                tile_id: definition.id,
                tile_count: self.tile_count,
            });
        }
        let merged = match self.tiles.remove(&definition.id) {
            Some(existing) => {
                let mut properties = existing.properties;
                properties.extend(definition.properties);
                TileDefinition::new(definition.id, properties)?
            }
            None => definition,
        };
        self.tiles.insert(merged.id, merged);
        Ok(())
    }

    /// Builder-style property declaration, used by tests and tools
    pub fn with_property(
        mut self,
        tile_id: u32,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<Self, ParseError> {
        let prop = TileProperty::classify(tile_id, name, value.into())?;
        self.insert(TileDefinition::new(tile_id, vec![prop])?)?;
        Ok(self)
    }

    /// Definition of a tile; `None` both for undeclared ids and ids outside
    /// the tileset
    pub fn tile(&self, id: u32) -> Option<&TileDefinition> {
        self.tiles.get(&id)
    }

    /// All tiles with declared properties, by ascending id
    pub fn tiles(&self) -> impl Iterator<Item = &TileDefinition> {
        self.tiles.values()
    }

    pub fn contains_id(&self, id: u32) -> bool {
        id < self.tile_count
    }

    /// Number of tiles with a collision box
    pub fn collision_tile_count(&self) -> usize {
        self.tiles.values().filter(|t| t.collision().is_some()).count()
    }

    /// Number of tiles that emit light
    pub fn light_tile_count(&self) -> usize {
        self.tiles.values().filter(|t| t.light().is_some()).count()
    }

    /// Pixel rectangle `(x, y, w, h)` of a tile in the atlas image
    pub fn atlas_rect(&self, id: u32) -> Option<(u32, u32, u32, u32)> {
        if !self.contains_id(id) || self.columns == 0 {
            return None;
        }
        let col = id % self.columns;
        let row = id / self.columns;
        let x = self.margin + col * (self.tile_width + self.spacing);
        let y = self.margin + row * (self.tile_height + self.spacing);
        Some((x, y, self.tile_width, self.tile_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    fn raw_tile(id: u32, props: &[(&str, PropertyValue)]) -> RawTile {
        RawTile {
            id,
            properties: props
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
        }
    }

    fn raw(tiles: Vec<RawTile>) -> RawTileset {
        RawTileset {
            name: "roguelikeSheet_transparent".to_string(),
            tile_width: 16,
            tile_height: 16,
            spacing: 1,
            tile_count: 1767,
            columns: 57,
            tiles,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_raw_classifies_tiles() {
        let tileset = Tileset::from_raw(raw(vec![
            raw_tile(137, &[("collision", "0.6,0,1,0.9".into())]),
            raw_tile(330, &[("door", "tavern_1a,0,0".into())]),
            raw_tile(416, &[("light", PropertyValue::Float(1.0))]),
            raw_tile(5, &[]),
        ]))
        .unwrap();

        assert!(tileset.tile(137).unwrap().collision().is_some());
        assert_eq!(tileset.tile(330).unwrap().door().unwrap().map_id, "tavern_1a");
        assert_eq!(tileset.tile(416).unwrap().light(), Some(1.0));
        assert!(tileset.tile(5).is_none());
        assert!(tileset.tile(4000).is_none());
        assert_eq!(tileset.collision_tile_count(), 1);
        assert_eq!(tileset.light_tile_count(), 1);
    }

    #[test]
    fn test_duplicate_collision_rejected() {
        let err = Tileset::from_raw(raw(vec![raw_tile(
            71,
            &[
                ("collision", "0,0,1,0.9".into()),
                ("collision", "0,0,1,1".into()),
            ],
        )]))
        .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DuplicateProperty);
        assert_eq!(err.tile_id(), Some(71));
    }

    #[test]
    fn test_duplicate_light_across_entries_rejected() {
        let err = Tileset::from_raw(raw(vec![
            raw_tile(416, &[("light", PropertyValue::Float(1.0))]),
            raw_tile(416, &[("light", PropertyValue::Float(0.5))]),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DuplicateProperty);
    }

    #[test]
    fn test_multiple_doors_kept_in_order() {
        let tileset = Tileset::from_raw(raw(vec![raw_tile(
            330,
            &[
                ("door", "tavern_1a,0,0".into()),
                ("door", "tavern_1b,1,0".into()),
            ],
        )]))
        .unwrap();
        let tile = tileset.tile(330).unwrap();
        let doors: Vec<_> = tile.doors().map(|d| d.map_id.as_str()).collect();
        assert_eq!(doors, ["tavern_1a", "tavern_1b"]);
        assert_eq!(tile.door().unwrap().map_id, "tavern_1a");
    }

    #[test]
    fn test_tile_out_of_range_rejected() {
        let err = Tileset::from_raw(raw(vec![raw_tile(
            1767,
            &[("collision", "0,0,1,1".into())],
        )]))
        .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::TileOutOfRange);
    }

    #[test]
    fn test_malformed_tile_rejects_whole_tileset() {
        let result = Tileset::from_raw(raw(vec![
            raw_tile(71, &[("collision", "0,0,1,0.9".into())]),
            raw_tile(72, &[("collision", "0,0,1".into())]),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_properties_preserved() {
        let tileset = Tileset::from_raw(raw(vec![raw_tile(
            9,
            &[("footstep", "stone".into()), ("collision", "0,0,1,1".into())],
        )]))
        .unwrap();
        let tile = tileset.tile(9).unwrap();
        assert_eq!(tile.unknown("footstep"), Some(&PropertyValue::from("stone")));
        assert_eq!(tile.properties().len(), 2);
    }

    #[test]
    fn test_atlas_rect_accounts_for_spacing() {
        let tileset = Tileset::from_raw(raw(vec![])).unwrap();
        assert_eq!(tileset.atlas_rect(0), Some((0, 0, 16, 16)));
        assert_eq!(tileset.atlas_rect(58), Some((17, 17, 16, 16)));
        assert_eq!(tileset.atlas_rect(1767), None);
    }

    #[test]
    fn test_builder_roundtrip_through_json() {
        let tileset = Tileset::new("t", 16, 16, 10)
            .with_property(3, "light", 0.5)
            .unwrap();
        let json = serde_json::to_string(&tileset).unwrap();
        let parsed: Tileset = serde_json::from_str(&json).unwrap();
        assert_eq!(tileset, parsed);
    }
}
