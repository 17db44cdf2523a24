//! Light field composition
//!
//! Every tile declaring a `light` property is a point emitter at the centre
//! of its cell. A sample sums the falloff of every emitter within the radius
//! and clamps the total to the configured maximum.
//!
//! [`LightingCompositor`] answers samples directly from a map. [`LightField`]
//! keeps emitters bucketed by cell and memoizes per-cell samples; a cell
//! change evicts only the samples within the falloff radius of that cell.

use crate::config::LightingConfig;
use rogue_map_core::{Point, Rect, TileMap};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// A light-emitting tile placed in a map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEmitter {
    pub layer: usize,
    pub row: u32,
    pub col: u32,
    pub intensity: f32,
}

/// Falloff and compositing rules
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightingCompositor {
    config: LightingConfig,
}

impl LightingCompositor {
    pub fn new(config: LightingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Contribution of one emitter at `distance` tiles
    ///
    /// Non-increasing in distance and exactly zero from the radius on.
    pub fn falloff(&self, intensity: f32, distance: f32) -> f32 {
        let c = &self.config;
        if distance >= c.radius || intensity <= 0.0 {
            return 0.0;
        }
        let x = distance / c.radius;
        let window = (1.0 - x * x).powi(2);
        let attenuation = c.constant + c.linear * distance + c.quadratic * distance * distance;
        intensity * window / attenuation
    }

    /// Every emitter of a map, layer by layer
    pub fn emitters(map: &TileMap) -> Vec<LightEmitter> {
        map.placed_tiles()
            .filter_map(|tile| {
                let intensity = tile.definition()?.light()?;
                Some(LightEmitter {
                    layer: tile.layer,
                    row: tile.row,
                    col: tile.col,
                    intensity,
                })
            })
            .collect()
    }

    /// Distance in tiles from a world point to the centre of a cell
    fn distance(map: &TileMap, point: Point, row: u32, col: u32) -> f32 {
        let center = map.cell_center(row, col);
        let dx = (point.x - center.x) / map.tile_width() as f32;
        let dy = (point.y - center.y) / map.tile_height() as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Cells that may hold an emitter reaching `point`
    fn window(&self, map: &TileMap, point: Point) -> Option<(RangeInclusive<u32>, RangeInclusive<u32>)> {
        // Emitters sit at cell centres, so pad by half a cell
        let reach_x = (self.config.radius + 0.5) * map.tile_width() as f32;
        let reach_y = (self.config.radius + 0.5) * map.tile_height() as f32;
        map.cells_covering(&Rect::new(
            point.x - reach_x,
            point.y - reach_y,
            point.x + reach_x,
            point.y + reach_y,
        ))
    }

    fn composite<I>(&self, map: &TileMap, point: Point, emitters: I) -> f32
    where
        I: IntoIterator<Item = (u32, u32, f32)>,
    {
        let total: f32 = emitters
            .into_iter()
            .map(|(row, col, intensity)| {
                self.falloff(intensity, Self::distance(map, point, row, col))
            })
            .sum();
        total.clamp(0.0, self.config.max_intensity)
    }

    /// Light intensity at a world point, computed from scratch
    pub fn field_at(&self, map: &TileMap, point: Point) -> f32 {
        let Some((rows, cols)) = self.window(map, point) else {
            return 0.0;
        };
        let emitters = rows.flat_map(|row| {
            cols.clone().flat_map(move |col| {
                map.stack_at(row, col)
                    .filter_map(|tile| tile.definition()?.light())
                    .map(move |intensity| (row, col, intensity))
            })
        });
        self.composite(map, point, emitters)
    }

    /// Light intensity at the centre of a cell
    pub fn sample_cell(&self, map: &TileMap, row: u32, col: u32) -> Option<f32> {
        if !map.in_bounds(row as i64, col as i64) {
            return None;
        }
        Some(self.field_at(map, map.cell_center(row, col)))
    }
}

/// Summed intensity of all layers' emitters at one cell
fn cell_intensity(map: &TileMap, row: u32, col: u32) -> f32 {
    map.stack_at(row, col)
        .filter_map(|tile| tile.definition()?.light())
        .sum()
}

/// Cached light field of one map
#[derive(Debug, Clone)]
pub struct LightField {
    compositor: LightingCompositor,
    map: Arc<TileMap>,
    /// Per-cell summed emitter intensity; cells without light are absent
    emitters: HashMap<(u32, u32), f32>,
    samples: HashMap<(u32, u32), f32>,
}

impl LightField {
    pub fn new(compositor: LightingCompositor, map: Arc<TileMap>) -> Self {
        let mut emitters: HashMap<(u32, u32), f32> = HashMap::new();
        for emitter in LightingCompositor::emitters(&map) {
            *emitters.entry((emitter.row, emitter.col)).or_default() += emitter.intensity;
        }
        tracing::debug!(map = %map.id, emitters = emitters.len(), "built light field");
        Self {
            compositor,
            map,
            emitters,
            samples: HashMap::new(),
        }
    }

    pub fn map(&self) -> &Arc<TileMap> {
        &self.map
    }

    pub fn compositor(&self) -> &LightingCompositor {
        &self.compositor
    }

    /// Number of cells holding at least one emitter
    pub fn emitter_cells(&self) -> usize {
        self.emitters.len()
    }

    /// Light intensity at a world point, from the cached emitters
    pub fn field_at(&self, point: Point) -> f32 {
        let Some((rows, cols)) = self.compositor.window(&self.map, point) else {
            return 0.0;
        };
        let emitters = rows.flat_map(|row| {
            cols.clone().filter_map(move |col| {
                self.emitters
                    .get(&(row, col))
                    .map(|intensity| (row, col, *intensity))
            })
        });
        self.compositor.composite(&self.map, point, emitters)
    }

    /// Light intensity at the centre of a cell, memoized
    pub fn sample_cell(&mut self, row: u32, col: u32) -> Option<f32> {
        if !self.map.in_bounds(row as i64, col as i64) {
            return None;
        }
        if let Some(value) = self.samples.get(&(row, col)) {
            return Some(*value);
        }
        let value = self.field_at(self.map.cell_center(row, col));
        self.samples.insert((row, col), value);
        Some(value)
    }

    pub fn is_cached(&self, row: u32, col: u32) -> bool {
        self.samples.contains_key(&(row, col))
    }

    pub fn cached_samples(&self) -> usize {
        self.samples.len()
    }

    /// Swap in a snapshot that differs from the current one at `(row, col)`
    /// only
    ///
    /// Re-reads the emitters of that cell and evicts the memoized samples it
    /// can reach. Returns the number of evicted samples.
    pub fn apply_cell_change(&mut self, map: Arc<TileMap>, row: u32, col: u32) -> usize {
        self.map = map;
        let intensity = cell_intensity(&self.map, row, col);
        if intensity > 0.0 {
            self.emitters.insert((row, col), intensity);
        } else {
            self.emitters.remove(&(row, col));
        }

        let radius = self.compositor.config.radius;
        let before = self.samples.len();
        self.samples.retain(|&(r, c), _| {
            let dr = r as f32 - row as f32;
            let dc = c as f32 - col as f32;
            (dr * dr + dc * dc).sqrt() >= radius
        });
        let evicted = before - self.samples.len();
        tracing::trace!(row, col, evicted, "light field cell change");
        evicted
    }

    /// Drop every memoized sample
    pub fn invalidate_all(&mut self) {
        self.samples.clear();
    }
}
