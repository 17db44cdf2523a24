//! Tiled document formats
//!
//! Tilesets and maps are accepted as Tiled XML (`.tsx` / `.tmx`) or Tiled
//! JSON (`.tsj` / `.tmj`); the format is sniffed from the first
//! non-whitespace byte. Per-layer CSV exports are handled by [`csv`].

pub mod csv;
mod json;
mod xml;

use crate::error::{LoadError, ParseError};
use crate::tileset::{RawTileset, Tileset};

/// Serialization format of a Tiled document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Xml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from the document text
    pub fn sniff(text: &str) -> Option<Self> {
        match text.trim_start().as_bytes().first()? {
            b'<' => Some(DocumentFormat::Xml),
            b'{' => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// How a map refers to one of its tilesets
#[derive(Debug, Clone)]
pub enum TilesetSource {
    /// External tileset document, path relative to the map document
    External(String),
    /// Tileset declared inside the map document
    Inline(RawTileset),
}

/// A tileset entry of a map document
#[derive(Debug, Clone)]
pub struct MapTilesetEntry {
    pub first_gid: u32,
    pub source: TilesetSource,
}

/// A tile layer of a map document, gids still raw
#[derive(Debug, Clone)]
pub struct LayerDocument {
    pub name: String,
    pub visible: bool,
    pub gids: Vec<u32>,
}

/// A map document as read from disk, before tilesets are resolved
#[derive(Debug, Clone, Default)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<MapTilesetEntry>,
    pub layers: Vec<LayerDocument>,
}

/// Parse a tileset document (XML or JSON) without validating its tiles
pub fn parse_raw_tileset(text: &str) -> Result<RawTileset, ParseError> {
    match DocumentFormat::sniff(text) {
        Some(DocumentFormat::Xml) => xml::parse_tileset(text),
        Some(DocumentFormat::Json) => json::parse_tileset(text),
        None => Err(ParseError::Syntax(
            "not a Tiled XML or JSON document".to_string(),
        )),
    }
}

/// Parse and validate a tileset document
pub fn parse_tileset(text: &str) -> Result<Tileset, ParseError> {
    let raw = parse_raw_tileset(text)?;
    let tileset = Tileset::from_raw(raw)?;
    tracing::debug!(
        name = %tileset.name,
        tiles = tileset.tile_count,
        collision = tileset.collision_tile_count(),
        lights = tileset.light_tile_count(),
        "parsed tileset"
    );
    Ok(tileset)
}

/// Parse a map document (XML or JSON)
pub fn parse_map(text: &str) -> Result<MapDocument, LoadError> {
    match DocumentFormat::sniff(text) {
        Some(DocumentFormat::Xml) => xml::parse_map(text),
        Some(DocumentFormat::Json) => json::parse_map(text),
        None => Err(LoadError::Malformed(
            "not a Tiled XML or JSON document".to_string(),
        )),
    }
}
