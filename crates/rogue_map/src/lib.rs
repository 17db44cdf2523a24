//! # rogue_map
//!
//! Tiled tileset and tilemap interpretation for roguelikes.
//!
//! Tilesets declare per-tile `collision` boxes, `light` intensities and
//! `door` links; this crate loads them together with the maps that use them
//! and answers the questions a game asks every tick:
//!
//! - is this point or box blocked?
//! - how bright is it here?
//! - does this cell lead somewhere else, and what happens when I step on it?
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rogue_map::prelude::*;
//!
//! let mut loader = AssetLoader::new(DirectorySource::new("assets"));
//! let mut session = MapSession::new(loader.load_map("billy_map")?);
//!
//! let blocked = CollisionResolver::new(session.map()).blocks_point(Point::new(45.0, 50.0));
//! let light = LightingCompositor::default().field_at(session.map(), Point::new(45.0, 50.0));
//!
//! if let TransitionState::TransitionRequested(_) = session.enter_cell(3, 4) {
//!     let arrival = session.complete_transition(&mut loader)?;
//! }
//! ```
//!
//! ## Crates
//!
//! - `rogue_map_core` - data model and Tiled XML/JSON formats
//! - `rogue_map_runtime` - registry, loader, collision, lighting, doors and sessions

pub use rogue_map_core;
pub use rogue_map_runtime;

/// Commonly used types
pub mod prelude {
    pub use rogue_map_core::{
        CellTile, CollisionBox, DoorRef, FlipFlags, Layer, LoadError, LoadErrorKind, ParseError,
        ParseErrorKind, Point, PropertyValue, Rect, TileDefinition, TileMap, TileMapBuilder,
        TileProperty, Tileset,
    };
    pub use rogue_map_runtime::{
        load_map, Arrival, AssetLoader, AssetSource, CollisionResolver, CollisionShape,
        DirectorySource, DoorResolver, DoorTarget, EngineConfig, LightField, LightingCompositor,
        MapProvider, MapSession, MemorySource, TilesetRegistry, TilesetResolver, TransitionError,
        TransitionState,
    };
}
