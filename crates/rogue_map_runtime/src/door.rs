//! Door resolution
//!
//! A door-tagged tile links its cell to a cell of another map. Resolving a
//! door only reads the current map; the target is loaded (and the
//! destination checked against its bounds) when the transition actually
//! happens, see [`crate::MapSession`].

use rogue_map_core::{DoorRef, TileMap};
use serde::Serialize;

/// A door found at a map cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DoorTarget {
    /// Map the door leads to
    pub map_id: String,
    /// Layer holding the door tile
    pub layer: usize,
    /// Door cell in the current map
    pub row: u32,
    pub col: u32,
    /// Column offset applied in the target map
    pub dx: i32,
    /// Row offset applied in the target map
    pub dy: i32,
}

impl DoorTarget {
    fn new(door: &DoorRef, layer: usize, row: u32, col: u32) -> Self {
        Self {
            map_id: door.map_id.clone(),
            layer,
            row,
            col,
            dx: door.dx,
            dy: door.dy,
        }
    }

    /// Destination `(row, col)` in the target map; may be out of bounds
    pub fn destination(&self) -> (i64, i64) {
        (
            self.row as i64 + self.dy as i64,
            self.col as i64 + self.dx as i64,
        )
    }

    /// Destination cell if it lies inside `target`
    pub fn destination_in(&self, target: &TileMap) -> Option<(u32, u32)> {
        let (row, col) = self.destination();
        target
            .in_bounds(row, col)
            .then_some((row as u32, col as u32))
    }
}

/// Door queries over one map snapshot
#[derive(Debug, Clone, Copy)]
pub struct DoorResolver<'a> {
    map: &'a TileMap,
}

impl<'a> DoorResolver<'a> {
    pub fn new(map: &'a TileMap) -> Self {
        Self { map }
    }

    /// The door at a cell, searching from the top layer down
    ///
    /// Returns the first door link of the topmost door tile.
    pub fn resolve(&self, row: u32, col: u32) -> Option<DoorTarget> {
        self.map.stack_at(row, col).rev().find_map(|tile| {
            let door = tile.definition()?.door()?;
            Some(DoorTarget::new(door, tile.layer, row, col))
        })
    }

    /// Every door link at a cell, top layer first and in declaration order
    /// within a tile
    pub fn resolve_all(&self, row: u32, col: u32) -> Vec<DoorTarget> {
        self.map
            .stack_at(row, col)
            .rev()
            .filter_map(|tile| Some((tile.layer, tile.definition()?)))
            .flat_map(|(layer, def)| def.doors().map(move |door| DoorTarget::new(door, layer, row, col)))
            .collect()
    }

    /// The resolved door of every door cell, row by row
    pub fn doors(&self) -> Vec<DoorTarget> {
        let mut doors: Vec<DoorTarget> = Vec::new();
        for row in 0..self.map.height() {
            for col in 0..self.map.width() {
                doors.extend(self.resolve(row, col));
            }
        }
        doors
    }
}
