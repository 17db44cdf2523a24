//! Error taxonomy for tileset parsing and map loading
//!
//! Both error types are fatal to the document being loaded: a tileset with a
//! single bad tile yields no tileset, and a map with a single bad cell yields
//! no map.

use crate::collision::BoxError;
use thiserror::Error;

/// Coarse category of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    MalformedGeometry,
    DuplicateProperty,
    MalformedDoorRef,
    InvalidLight,
    TileOutOfRange,
    Syntax,
}

/// A tileset document could not be turned into a [`crate::Tileset`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("tile {tile_id}: malformed collision box '{value}': {source}")]
    MalformedGeometry {
        tile_id: u32,
        value: String,
        #[source]
        source: BoxError,
    },
    #[error("tile {tile_id}: more than one '{property}' property")]
    DuplicateProperty { tile_id: u32, property: String },
    #[error("tile {tile_id}: malformed door reference '{value}' (expected \"mapId,dx,dy\")")]
    MalformedDoorRef { tile_id: u32, value: String },
    #[error("tile {tile_id}: light intensity '{value}' is not a non-negative number")]
    InvalidLight { tile_id: u32, value: String },
    #[error("tile id {tile_id} is outside the tileset (tilecount {tile_count})")]
    TileOutOfRange { tile_id: u32, tile_count: u32 },
    #[error("malformed tileset document: {0}")]
    Syntax(String),
}

impl ParseError {
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            ParseError::MalformedGeometry { .. } => ParseErrorKind::MalformedGeometry,
            ParseError::DuplicateProperty { .. } => ParseErrorKind::DuplicateProperty,
            ParseError::MalformedDoorRef { .. } => ParseErrorKind::MalformedDoorRef,
            ParseError::InvalidLight { .. } => ParseErrorKind::InvalidLight,
            ParseError::TileOutOfRange { .. } => ParseErrorKind::TileOutOfRange,
            ParseError::Syntax(_) => ParseErrorKind::Syntax,
        }
    }

    /// The tile the error is attributed to, if any
    pub fn tile_id(&self) -> Option<u32> {
        match self {
            ParseError::MalformedGeometry { tile_id, .. }
            | ParseError::DuplicateProperty { tile_id, .. }
            | ParseError::MalformedDoorRef { tile_id, .. }
            | ParseError::InvalidLight { tile_id, .. }
            | ParseError::TileOutOfRange { tile_id, .. } => Some(*tile_id),
            ParseError::Syntax(_) => None,
        }
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

/// Coarse category of a [`LoadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    UnknownTileset,
    DimensionMismatch,
    OverlappingTilesets,
    Malformed,
    Tileset,
    Source,
    MapNotFound,
}

/// A map document could not be turned into a [`crate::TileMap`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("layer '{layer}' references global tile id {gid}, which no tileset covers")]
    UnknownTileset { layer: String, gid: u32 },
    #[error("layer '{layer}' has {actual} cells, expected {width}x{height} = {expected}")]
    DimensionMismatch {
        layer: String,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("tileset '{second}' (firstgid {second_first_gid}) overlaps tileset '{first}'")]
    OverlappingTilesets {
        first: String,
        second: String,
        second_first_gid: u32,
    },
    #[error("malformed map document: {0}")]
    Malformed(String),
    #[error("tileset '{name}' failed to parse: {source}")]
    Tileset {
        name: String,
        #[source]
        source: ParseError,
    },
    #[error("could not read '{path}': {message}")]
    Source { path: String, message: String },
    #[error("no map named '{0}'")]
    MapNotFound(String),
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::UnknownTileset { .. } => LoadErrorKind::UnknownTileset,
            LoadError::DimensionMismatch { .. } => LoadErrorKind::DimensionMismatch,
            LoadError::OverlappingTilesets { .. } => LoadErrorKind::OverlappingTilesets,
            LoadError::Malformed(_) => LoadErrorKind::Malformed,
            LoadError::Tileset { .. } => LoadErrorKind::Tileset,
            LoadError::Source { .. } => LoadErrorKind::Source,
            LoadError::MapNotFound(_) => LoadErrorKind::MapNotFound,
        }
    }
}

impl From<quick_xml::Error> for LoadError {
    fn from(err: quick_xml::Error) -> Self {
        LoadError::Malformed(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for LoadError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        LoadError::Malformed(err.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_kind_and_tile() {
        let err = ParseError::DuplicateProperty {
            tile_id: 12,
            property: "light".to_string(),
        };
        assert_eq!(err.kind(), ParseErrorKind::DuplicateProperty);
        assert_eq!(err.tile_id(), Some(12));
        assert!(err.to_string().contains("light"));
    }

    #[test]
    fn test_load_error_message() {
        let err = LoadError::UnknownTileset {
            layer: "Ground".to_string(),
            gid: 5000,
        };
        assert_eq!(err.kind(), LoadErrorKind::UnknownTileset);
        assert!(err.to_string().contains("5000"));
    }
}
