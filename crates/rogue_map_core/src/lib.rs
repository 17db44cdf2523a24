//! Core data structures for rogue_map
//!
//! This crate provides the fundamental types for interpreting Tiled maps:
//! - `Tileset` - Tile atlas metadata with per-tile collision, light and door properties
//! - `TileMap` - An immutable, validated layered grid drawing from one or more tilesets
//! - `Layer` - A single tile layer
//! - `CollisionBox` - Normalized per-tile collision geometry
//! - `DoorRef` - A door link to a cell of another map
//! - `PropertyValue` - Typed Tiled property value
//!
//! Documents are read by [`format`], which accepts Tiled XML (`.tsx`/`.tmx`)
//! and JSON (`.tsj`/`.tmj`).

mod collision;
mod error;
pub mod format;
mod geometry;
mod layer;
mod map;
mod property;
mod tileset;
mod value;

pub use collision::{BoxError, CollisionBox};
pub use error::{LoadError, LoadErrorKind, ParseError, ParseErrorKind};
pub use format::{parse_map, parse_tileset, DocumentFormat, MapDocument, TilesetSource};
pub use geometry::{Point, Rect};
pub use layer::{CellTile, FlipFlags, Layer};
pub use map::{PlacedTile, ResolvedTile, TileMap, TileMapBuilder, TilesetRef};
pub use property::{DoorRef, TileProperty, COLLISION, DOOR, LIGHT};
pub use tileset::{RawTile, RawTileset, TileDefinition, Tileset, TilesetImage};
pub use value::PropertyValue;
