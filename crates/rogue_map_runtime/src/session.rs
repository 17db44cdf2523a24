//! Map transitions
//!
//! A [`MapSession`] owns the active map of one player or entity and drives
//! the transition state machine:
//!
//! ```text
//! Exploring --enter door cell--> TransitionRequested
//! TransitionRequested --target loaded--> Exploring (new map)
//! TransitionRequested --load failed----> Exploring (old map, error returned)
//! ```
//!
//! The active map is only replaced once the target is fully loaded and the
//! destination is known to be inside it, so a failed transition leaves the
//! old map exactly as it was.

use crate::door::{DoorResolver, DoorTarget};
use crate::loader::MapProvider;
use rogue_map_core::{LoadError, Point, TileMap};
use std::sync::Arc;
use thiserror::Error;

/// Why a transition did not complete
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("no transition is pending")]
    NotRequested,
    #[error("failed to load map '{map_id}': {source}")]
    Load {
        map_id: String,
        #[source]
        source: LoadError,
    },
    #[error("door leads to cell ({row}, {col}) outside map '{map_id}' ({width}x{height})")]
    DestinationOutOfBounds {
        map_id: String,
        row: i64,
        col: i64,
        width: u32,
        height: u32,
    },
}

/// Where a session stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionState {
    Exploring,
    TransitionRequested(DoorTarget),
}

/// Result of a completed transition
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub map_id: String,
    pub row: u32,
    pub col: u32,
    /// World-space centre of the arrival cell
    pub position: Point,
}

/// The active map of one player, plus its transition state
#[derive(Debug, Clone)]
pub struct MapSession {
    active: Arc<TileMap>,
    state: TransitionState,
}

impl MapSession {
    pub fn new(map: impl Into<Arc<TileMap>>) -> Self {
        Self {
            active: map.into(),
            state: TransitionState::Exploring,
        }
    }

    /// A handle to the active map; it stays valid and unchanged across later
    /// transitions
    pub fn active(&self) -> Arc<TileMap> {
        Arc::clone(&self.active)
    }

    pub fn map(&self) -> &TileMap {
        &self.active
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_exploring(&self) -> bool {
        self.state == TransitionState::Exploring
    }

    /// The door at a cell of the active map; never loads anything
    pub fn door_at(&self, row: u32, col: u32) -> Option<DoorTarget> {
        DoorResolver::new(&self.active).resolve(row, col)
    }

    /// Report that the player entered a cell
    ///
    /// Entering a door cell while exploring requests a transition. While a
    /// transition is pending further moves are ignored.
    pub fn enter_cell(&mut self, row: u32, col: u32) -> &TransitionState {
        if self.is_exploring() {
            if let Some(door) = self.door_at(row, col) {
                tracing::debug!(
                    from = %self.active.id,
                    to = %door.map_id,
                    row,
                    col,
                    "transition requested"
                );
                self.state = TransitionState::TransitionRequested(door);
            }
        }
        &self.state
    }

    /// Drop a pending transition without loading anything
    pub fn cancel_transition(&mut self) -> Option<DoorTarget> {
        match std::mem::replace(&mut self.state, TransitionState::Exploring) {
            TransitionState::TransitionRequested(door) => Some(door),
            TransitionState::Exploring => None,
        }
    }

    /// Load the pending door's target map and make it active
    ///
    /// On any failure the session is back to exploring the old map.
    pub fn complete_transition<P: MapProvider + ?Sized>(
        &mut self,
        provider: &mut P,
    ) -> Result<Arrival, TransitionError> {
        let door = match std::mem::replace(&mut self.state, TransitionState::Exploring) {
            TransitionState::TransitionRequested(door) => door,
            TransitionState::Exploring => return Err(TransitionError::NotRequested),
        };

        let target = provider.load_map(&door.map_id).map_err(|source| {
            tracing::warn!(map = %door.map_id, error = %source, "transition aborted");
            TransitionError::Load {
                map_id: door.map_id.clone(),
                source,
            }
        })?;

        let Some((row, col)) = door.destination_in(&target) else {
            let (row, col) = door.destination();
            tracing::warn!(map = %door.map_id, row, col, "transition aborted: destination out of bounds");
            return Err(TransitionError::DestinationOutOfBounds {
                map_id: door.map_id,
                row,
                col,
                width: target.width(),
                height: target.height(),
            });
        };

        let arrival = Arrival {
            map_id: door.map_id,
            row,
            col,
            position: target.cell_center(row, col),
        };
        tracing::info!(
            from = %self.active.id,
            to = %arrival.map_id,
            row,
            col,
            "map transition"
        );
        self.active = Arc::new(target);
        Ok(arrival)
    }
}
