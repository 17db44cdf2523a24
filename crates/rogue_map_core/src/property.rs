//! Recognized tile properties
//!
//! A tile's raw `(name, value)` pairs are classified once, at tileset parse
//! time, into a closed set of kinds. Resolvers match on [`TileProperty`]
//! rather than looking names up in a string map.

use crate::collision::CollisionBox;
use crate::error::ParseError;
use crate::value::PropertyValue;
use serde::{Deserialize, Serialize};

/// Property name for collision boxes
pub const COLLISION: &str = "collision";
/// Property name for light emitters
pub const LIGHT: &str = "light";
/// Property name for door links
pub const DOOR: &str = "door";

/// A door link as written in the tileset: `"<mapId>,<dx>,<dy>"`
///
/// The offsets are in destination-grid cells and may be zero or negative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorRef {
    pub map_id: String,
    pub dx: i32,
    pub dy: i32,
}

impl DoorRef {
    pub fn new(map_id: impl Into<String>, dx: i32, dy: i32) -> Self {
        Self {
            map_id: map_id.into(),
            dx,
            dy,
        }
    }

    /// Parse `"mapId,dx,dy"`; `None` unless there are exactly three tokens,
    /// a non-empty map id and two integers
    pub fn parse(value: &str) -> Option<Self> {
        let mut tokens = value.split(',').map(str::trim);
        let map_id = tokens.next().filter(|id| !id.is_empty())?;
        let dx = tokens.next()?.parse().ok()?;
        let dy = tokens.next()?.parse().ok()?;
        if tokens.next().is_some() {
            return None;
        }
        Some(Self::new(map_id, dx, dy))
    }
}

impl std::fmt::Display for DoorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.map_id, self.dx, self.dy)
    }
}

/// A classified, validated tile property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileProperty {
    Collision(CollisionBox),
    Light { intensity: f32 },
    Door(DoorRef),
    /// Any other property, kept verbatim and otherwise ignored
    Unknown { name: String, value: PropertyValue },
}

impl TileProperty {
    /// Classify a raw property of tile `tile_id`
    pub fn classify(tile_id: u32, name: &str, value: PropertyValue) -> Result<Self, ParseError> {
        match name {
            COLLISION => {
                let raw = value.as_str().unwrap_or_default();
                CollisionBox::parse(raw)
                    .map(TileProperty::Collision)
                    .map_err(|e| ParseError::MalformedGeometry {
                        tile_id,
                        value: raw.to_string(),
                        source: e,
                    })
            }
            LIGHT => match value.as_float().map(|f| f as f32) {
                Some(intensity) if intensity.is_finite() && intensity >= 0.0 => {
                    Ok(TileProperty::Light { intensity })
                }
                _ => Err(ParseError::InvalidLight {
                    tile_id,
                    value: describe(&value),
                }),
            },
            DOOR => {
                let raw = value.as_str().unwrap_or_default();
                DoorRef::parse(raw)
                    .map(TileProperty::Door)
                    .ok_or_else(|| ParseError::MalformedDoorRef {
                        tile_id,
                        value: raw.to_string(),
                    })
            }
            _ => Ok(TileProperty::Unknown {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// The property name this value was declared under
    pub fn name(&self) -> &str {
        match self {
            TileProperty::Collision(_) => COLLISION,
            TileProperty::Light { .. } => LIGHT,
            TileProperty::Door(_) => DOOR,
            TileProperty::Unknown { name, .. } => name,
        }
    }
}

fn describe(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Float(f) => f.to_string(),
        PropertyValue::Int(i) => i.to_string(),
        other => format!("<{}>", other.type_name()),
    }
}
