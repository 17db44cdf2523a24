//! Collision queries against a loaded map
//!
//! Shapes are never stored: each query walks the cells under the point or
//! box and places the declared collision box of every tile there, on every
//! layer, into world space. Collision is the union over layers, so a
//! decorative tile without a `collision` property never hides a blocking
//! tile beneath it. Declared boxes are used exactly as written.

use rogue_map_core::{PlacedTile, Point, Rect, TileMap};

/// A world-space collision rectangle and the tile it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionShape {
    pub rect: Rect,
    pub layer: usize,
    pub row: u32,
    pub col: u32,
    /// Global id of the tile (flip bits removed)
    pub gid: u32,
}

/// Point and box queries over one map snapshot
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver<'a> {
    map: &'a TileMap,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(map: &'a TileMap) -> Self {
        Self { map }
    }

    /// World-space shape of a placed tile, if it declares a collision box
    pub fn shape_of(&self, tile: &PlacedTile<'_>) -> Option<CollisionShape> {
        let declared = tile.definition()?.collision()?;
        let rect = declared.flipped(tile.tile.flip).to_world(
            self.map.cell_origin(tile.row, tile.col),
            self.map.tile_width() as f32,
            self.map.tile_height() as f32,
        );
        Some(CollisionShape {
            rect,
            layer: tile.layer,
            row: tile.row,
            col: tile.col,
            gid: tile.tile.gid,
        })
    }

    /// Shapes of every layer at one cell, bottom layer first
    pub fn cell_shapes(&self, row: u32, col: u32) -> impl Iterator<Item = CollisionShape> + '_ {
        self.map.stack_at(row, col).filter_map(move |tile| self.shape_of(&tile))
    }

    /// Every shape containing a world point
    pub fn shapes_at(&self, point: Point) -> Vec<CollisionShape> {
        // A box never leaves its own cell, so only one cell can contain the point
        let Some((row, col)) = self.map.cell_at(point) else {
            return Vec::new();
        };
        self.cell_shapes(row, col)
            .filter(|shape| shape.rect.contains(point))
            .collect()
    }

    /// Whether any shape contains a world point
    pub fn blocks_point(&self, point: Point) -> bool {
        !self.shapes_at(point).is_empty()
    }

    /// Every shape whose interior overlaps a world box
    pub fn shapes_in(&self, area: &Rect) -> Vec<CollisionShape> {
        let Some((rows, cols)) = self.map.cells_covering(area) else {
            return Vec::new();
        };
        let mut shapes = Vec::new();
        for row in rows {
            for col in cols.clone() {
                shapes.extend(self.cell_shapes(row, col).filter(|s| s.rect.overlaps(area)));
            }
        }
        shapes
    }

    /// Whether a world box overlaps any shape
    pub fn overlaps(&self, area: &Rect) -> bool {
        let Some((rows, cols)) = self.map.cells_covering(area) else {
            return false;
        };
        rows.into_iter().any(|row| {
            cols.clone()
                .any(|col| self.cell_shapes(row, col).any(|s| s.rect.overlaps(area)))
        })
    }
}
