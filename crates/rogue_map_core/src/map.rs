//! Tile maps: layered grids drawing from one or more tilesets
//!
//! Global tile ids form one flat space split between tilesets by their
//! `firstgid`. Tilesets are kept in a `BTreeMap` keyed by `firstgid`, so the
//! owner of a gid is the entry with the greatest `firstgid <= gid`, provided
//! the gid falls inside that tileset's tile count.

use crate::error::LoadError;
use crate::geometry::{Point, Rect};
use crate::layer::{CellTile, Layer};
use crate::tileset::{TileDefinition, Tileset};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// A tileset as referenced by a map
#[derive(Debug, Clone)]
pub struct TilesetRef {
    /// First global id owned by this tileset
    pub first_gid: u32,
    /// Source path (or inline name) the map referenced it by
    pub source: String,
    pub tileset: Arc<Tileset>,
}

impl TilesetRef {
    /// Global ids owned by this tileset
    pub fn gid_range(&self) -> std::ops::Range<u32> {
        self.first_gid..self.first_gid.saturating_add(self.tileset.tile_count)
    }
}

/// A global id resolved to its owning tileset
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTile<'a> {
    pub tileset: &'a TilesetRef,
    /// Tile id local to the tileset
    pub local_id: u32,
}

impl<'a> ResolvedTile<'a> {
    /// Declared metadata of the tile, if any
    pub fn definition(&self) -> Option<&'a TileDefinition> {
        self.tileset.tileset.tile(self.local_id)
    }
}

/// A tile found at a map cell
#[derive(Debug, Clone, Copy)]
pub struct PlacedTile<'a> {
    pub layer: usize,
    pub row: u32,
    pub col: u32,
    pub tile: CellTile,
    pub resolved: ResolvedTile<'a>,
}

impl<'a> PlacedTile<'a> {
    pub fn definition(&self) -> Option<&'a TileDefinition> {
        self.resolved.definition()
    }
}

/// An immutable, fully validated tile map
///
/// Every non-empty cell resolves to exactly one tileset. Changing a cell
/// produces a new map (see [`TileMap::with_cell`]); layers are shared between
/// snapshots through `Arc`, so only the touched layer is copied.
#[derive(Debug, Clone)]
pub struct TileMap {
    /// Identifier the map was loaded under; door links refer to it
    pub id: String,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    tilesets: BTreeMap<u32, TilesetRef>,
    layers: Vec<Arc<Layer>>,
}

impl TileMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Layers, bottom to top
    pub fn layers(&self) -> &[Arc<Layer>] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index).map(|l| l.as_ref())
    }

    /// Find a layer index by name
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Tilesets by ascending first gid
    pub fn tilesets(&self) -> impl Iterator<Item = &TilesetRef> {
        self.tilesets.values()
    }

    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && row < self.height as i64 && col < self.width as i64
    }

    /// Range search for the tileset owning `gid`
    pub fn resolve_gid(&self, gid: u32) -> Option<ResolvedTile<'_>> {
        let (_, tileset) = self.tilesets.range(..=gid).next_back()?;
        let local_id = gid - tileset.first_gid;
        tileset.tileset.contains_id(local_id).then_some(ResolvedTile {
            tileset,
            local_id,
        })
    }

    /// The tile on one layer at a cell
    pub fn tile_at(&self, layer: usize, row: u32, col: u32) -> Option<PlacedTile<'_>> {
        let tile = self.layers.get(layer)?.get(row, col)?;
        let resolved = self.resolve_gid(tile.gid)?;
        Some(PlacedTile {
            layer,
            row,
            col,
            tile,
            resolved,
        })
    }

    /// Every tile stacked at a cell, bottom layer first
    pub fn stack_at(&self, row: u32, col: u32) -> impl DoubleEndedIterator<Item = PlacedTile<'_>> {
        (0..self.layers.len()).filter_map(move |layer| self.tile_at(layer, row, col))
    }

    /// Every placed tile of the map, layer by layer
    pub fn placed_tiles(&self) -> impl Iterator<Item = PlacedTile<'_>> {
        self.layers.iter().enumerate().flat_map(move |(layer, l)| {
            l.iter_tiles().filter_map(move |(row, col, tile)| {
                Some(PlacedTile {
                    layer,
                    row,
                    col,
                    tile,
                    resolved: self.resolve_gid(tile.gid)?,
                })
            })
        })
    }

    /// World-space top-left corner of a cell
    pub fn cell_origin(&self, row: u32, col: u32) -> Point {
        Point::new(
            col as f32 * self.tile_width as f32,
            row as f32 * self.tile_height as f32,
        )
    }

    /// World-space centre of a cell
    pub fn cell_center(&self, row: u32, col: u32) -> Point {
        let origin = self.cell_origin(row, col);
        Point::new(
            origin.x + self.tile_width as f32 * 0.5,
            origin.y + self.tile_height as f32 * 0.5,
        )
    }

    /// World-space bounds of the whole map
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_width as f32,
            self.height as f32 * self.tile_height as f32,
        )
    }

    /// Cell containing a world point, as `(row, col)`
    pub fn cell_at(&self, p: Point) -> Option<(u32, u32)> {
        if !self.bounds().contains(p) {
            return None;
        }
        let col = (p.x / self.tile_width as f32).floor() as u32;
        let row = (p.y / self.tile_height as f32).floor() as u32;
        Some((row.min(self.height - 1), col.min(self.width - 1)))
    }

    /// Cells whose interior a world rectangle touches, clamped to the map,
    /// as `(rows, cols)`
    pub fn cells_covering(&self, rect: &Rect) -> Option<(RangeInclusive<u32>, RangeInclusive<u32>)> {
        let clipped = rect.intersection(&self.bounds())?;
        let tw = self.tile_width as f32;
        let th = self.tile_height as f32;
        let first_col = (clipped.min.x / tw).floor() as u32;
        let first_row = (clipped.min.y / th).floor() as u32;
        // max is exclusive: a box ending exactly on a cell edge does not reach the next cell
        let last_col = ((clipped.max.x / tw).ceil() as u32).saturating_sub(1);
        let last_row = ((clipped.max.y / th).ceil() as u32).saturating_sub(1);
        Some((
            first_row..=last_row.clamp(first_row, self.height - 1),
            first_col..=last_col.clamp(first_col, self.width - 1),
        ))
    }

    /// A new snapshot with one cell replaced
    ///
    /// `raw_gid` is a Tiled gid (flip bits allowed, `0` clears the cell). The
    /// new gid must resolve to one of the map's tilesets.
    pub fn with_cell(&self, layer: usize, row: u32, col: u32, raw_gid: u32) -> Result<TileMap, LoadError> {
        let Some(current) = self.layers.get(layer) else {
            return Err(LoadError::Malformed(format!(
                "map '{}' has no layer {layer}",
                self.id
            )));
        };
        if row >= self.height || col >= self.width {
            return Err(LoadError::Malformed(format!(
                "cell ({row}, {col}) is outside map '{}' ({}x{})",
                self.id, self.width, self.height
            )));
        }
        let tile = CellTile::decode(raw_gid);
        if let Some(tile) = tile {
            if self.resolve_gid(tile.gid).is_none() {
                return Err(LoadError::UnknownTileset {
                    layer: current.name.clone(),
                    gid: tile.gid,
                });
            }
        }

        let mut next = self.clone();
        let mut edited = Layer::clone(current);
        edited.set(row, col, tile);
        next.layers[layer] = Arc::new(edited);
        Ok(next)
    }
}

/// Assembles and validates a [`TileMap`]
#[derive(Debug)]
pub struct TileMapBuilder {
    map: TileMap,
}

impl TileMapBuilder {
    pub fn new(id: impl Into<String>, width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            map: TileMap {
                id: id.into(),
                width,
                height,
                tile_width,
                tile_height,
                tilesets: BTreeMap::new(),
                layers: Vec::new(),
            },
        }
    }

    /// Register a tileset owning `first_gid..first_gid + tile_count`
    pub fn add_tileset(
        &mut self,
        first_gid: u32,
        source: impl Into<String>,
        tileset: Arc<Tileset>,
    ) -> Result<&mut Self, LoadError> {
        let source = source.into();
        if first_gid == 0 {
            return Err(LoadError::Malformed(format!(
                "tileset '{source}' has firstgid 0"
            )));
        }
        let candidate = TilesetRef {
            first_gid,
            source,
            tileset,
        };
        let range = candidate.gid_range();

        let below = self.map.tilesets.range(..=first_gid).next_back();
        let above = self.map.tilesets.range(first_gid..).next();
        for existing in below.into_iter().chain(above).map(|(_, t)| t) {
            let other = existing.gid_range();
            if range.start < other.end && other.start < range.end {
                return Err(LoadError::OverlappingTilesets {
                    first: existing.source.clone(),
                    second: candidate.source,
                    second_first_gid: first_gid,
                });
            }
        }

        self.map.tilesets.insert(first_gid, candidate);
        Ok(self)
    }

    /// Add a layer from raw Tiled gids (row-major, `0` = empty)
    ///
    /// Register tilesets first: every gid is resolved here.
    pub fn add_layer(&mut self, name: impl Into<String>, visible: bool, raw_gids: &[u32]) -> Result<&mut Self, LoadError> {
        let name = name.into();
        let expected = (self.map.width as usize) * (self.map.height as usize);
        if raw_gids.len() != expected {
            return Err(LoadError::DimensionMismatch {
                layer: name,
                width: self.map.width,
                height: self.map.height,
                expected,
                actual: raw_gids.len(),
            });
        }

        let mut cells = Vec::with_capacity(expected);
        for &raw in raw_gids {
            let cell = CellTile::decode(raw);
            if let Some(tile) = cell {
                if self.map.resolve_gid(tile.gid).is_none() {
                    return Err(LoadError::UnknownTileset {
                        layer: name,
                        gid: tile.gid,
                    });
                }
            }
            cells.push(cell);
        }

        // Length was checked above
        let mut layer = Layer::from_cells(name, self.map.width, self.map.height, cells)
            .ok_or_else(|| LoadError::Malformed("layer size changed while building".to_string()))?;
        layer.visible = visible;
        self.map.layers.push(Arc::new(layer));
        Ok(self)
    }

    /// Add a layer exported as CSV of tile ids local to the first tileset
    /// (`-1` = empty), one line per row
    pub fn add_csv_layer(&mut self, name: impl Into<String>, csv: &str) -> Result<&mut Self, LoadError> {
        let name = name.into();
        let first_gid = self
            .map
            .tilesets
            .keys()
            .next()
            .copied()
            .ok_or_else(|| LoadError::Malformed(format!("layer '{name}' added before any tileset")))?;
        let rows = crate::format::csv::parse_local_ids(csv)
            .map_err(|e| LoadError::Malformed(format!("layer '{name}': {e}")))?;

        let height = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != self.map.width as usize) {
            return Err(LoadError::DimensionMismatch {
                layer: name,
                width: self.map.width,
                height: self.map.height,
                expected: (self.map.width as usize) * (self.map.height as usize),
                actual: bad.len() * height,
            });
        }
        let gids: Vec<u32> = rows
            .into_iter()
            .flatten()
            .map(|id| id.map_or(0, |local| local + first_gid))
            .collect();
        self.add_layer(name, true, &gids)
    }

    pub fn build(self) -> TileMap {
        self.map
    }
}
