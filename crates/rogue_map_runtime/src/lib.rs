//! Tile-map interpretation engine for rogue_map
//!
//! This crate turns Tiled tilesets and maps into queryable game state:
//! - [`TilesetRegistry`] parses tilesets once and shares them between maps
//! - [`load_map`] / [`AssetLoader`] materialize validated [`TileMap`]s
//! - [`CollisionResolver`] answers point and box overlap queries
//! - [`LightingCompositor`] / [`LightField`] sample the composited light field
//! - [`DoorResolver`] finds door links, and [`MapSession`] performs transitions
//!
//! All queries work on immutable snapshots (`Arc<TileMap>`); the only
//! mutations are caching a tileset and swapping a session's active map.
//!
//! # Example
//!
//! ```rust,ignore
//! use rogue_map_runtime::{AssetLoader, CollisionResolver, DirectorySource, MapProvider, MapSession};
//!
//! let mut loader = AssetLoader::new(DirectorySource::new("assets"));
//! let mut session = MapSession::new(loader.load_map("billy_map")?);
//!
//! if CollisionResolver::new(session.map()).overlaps(&player_box) {
//!     // blocked
//! }
//! session.enter_cell(row, col);
//! if !session.is_exploring() {
//!     let arrival = session.complete_transition(&mut loader)?;
//! }
//! ```

pub mod collision;
pub mod config;
pub mod door;
pub mod lighting;
pub mod loader;
pub mod registry;
pub mod session;
pub mod source;

pub use collision::{CollisionResolver, CollisionShape};
pub use config::{AssetsConfig, ConfigError, EngineConfig, LightingConfig};
pub use door::{DoorResolver, DoorTarget};
pub use lighting::{LightEmitter, LightField, LightingCompositor};
pub use loader::{load_map, AssetLoader, MapProvider, RegistryResolver, TilesetResolver};
pub use registry::TilesetRegistry;
pub use session::{Arrival, MapSession, TransitionError, TransitionState};
pub use source::{AssetSource, DirectorySource, MemorySource, SourceError};

pub use rogue_map_core::TileMap;
