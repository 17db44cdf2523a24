//! Tile layers

use serde::{Deserialize, Serialize};

const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
// Hexagonal 120° rotation bit; carried by Tiled but meaningless on a square grid
const ROTATED_HEXAGONAL_120: u32 = 0x1000_0000;
const FLAG_MASK: u32 =
    FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY | ROTATED_HEXAGONAL_120;

/// Tiled flip bits stored in the high bits of a global tile id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlipFlags {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

impl FlipFlags {
    pub fn is_identity(&self) -> bool {
        !self.horizontal && !self.vertical && !self.diagonal
    }
}

/// A tile placed in a layer cell: a global id plus its flip bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellTile {
    /// Global tile id with the flip bits removed (never 0)
    pub gid: u32,
    #[serde(default, skip_serializing_if = "FlipFlags::is_identity")]
    pub flip: FlipFlags,
}

impl CellTile {
    pub fn new(gid: u32) -> Self {
        Self {
            gid,
            flip: FlipFlags::default(),
        }
    }

    /// Decode a raw Tiled gid; `0` (after stripping flags) is an empty cell
    pub fn decode(raw: u32) -> Option<Self> {
        let gid = raw & !FLAG_MASK;
        if gid == 0 {
            return None;
        }
        Some(Self {
            gid,
            flip: FlipFlags {
                horizontal: raw & FLIPPED_HORIZONTALLY != 0,
                vertical: raw & FLIPPED_VERTICALLY != 0,
                diagonal: raw & FLIPPED_DIAGONALLY != 0,
            },
        })
    }

    /// Re-encode as a raw Tiled gid
    pub fn encode(&self) -> u32 {
        let mut raw = self.gid;
        if self.flip.horizontal {
            raw |= FLIPPED_HORIZONTALLY;
        }
        if self.flip.vertical {
            raw |= FLIPPED_VERTICALLY;
        }
        if self.flip.diagonal {
            raw |= FLIPPED_DIAGONALLY;
        }
        raw
    }
}

/// A single tile layer: a row-major `width x height` grid of optional tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Visibility is a rendering hint; invisible layers still collide and emit light
    pub visible: bool,
    width: u32,
    height: u32,
    cells: Vec<Option<CellTile>>,
}

impl Layer {
    /// Create an empty layer
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            name: name.into(),
            visible: true,
            width,
            height,
            cells: vec![None; size],
        }
    }

    /// Create a layer from row-major cells; `None` if the cell count is not
    /// `width * height`
    pub fn from_cells(
        name: impl Into<String>,
        width: u32,
        height: u32,
        cells: Vec<Option<CellTile>>,
    ) -> Option<Self> {
        if cells.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            name: name.into(),
            visible: true,
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    /// Tile at a cell; `None` for empty or out-of-bounds cells
    pub fn get(&self, row: u32, col: u32) -> Option<CellTile> {
        self.index(row, col).and_then(|i| self.cells[i])
    }

    /// Replace a cell, returning the previous content; out-of-bounds writes
    /// are ignored and return `None`
    pub fn set(&mut self, row: u32, col: u32, tile: Option<CellTile>) -> Option<CellTile> {
        let i = self.index(row, col)?;
        std::mem::replace(&mut self.cells[i], tile)
    }

    /// Iterate non-empty cells as `(row, col, tile)`
    pub fn iter_tiles(&self) -> impl Iterator<Item = (u32, u32, CellTile)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|tile| ((i as u32) / width, (i as u32) % width, tile))
        })
    }

    /// Number of non-empty cells
    pub fn tile_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}
