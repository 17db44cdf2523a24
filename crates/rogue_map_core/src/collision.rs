//! Normalized per-tile collision boxes
//!
//! A collision box is a sub-rectangle of the tile's unit square, written in
//! the tileset as `"left,top,right,bottom"`. Walls use `0,0,1,1`, thin
//! railings inset both sides (`0.05,0,0.95,1`), half-width pillars hug one
//! edge (`0.6,0,1,0.9`). The box is used exactly as declared.

use crate::geometry::{Point, Rect};
use crate::layer::FlipFlags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collision box in tile-local normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Why a collision box was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoxError {
    #[error("expected 4 values, found {0}")]
    TokenCount(usize),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("coordinates must lie in [0, 1]")]
    OutOfRange,
    /// `left >= right` or `top >= bottom`
    #[error("left must be < right and top < bottom")]
    Inverted,
}

impl CollisionBox {
    /// The whole tile
    pub const FULL: CollisionBox = CollisionBox {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    /// Create a validated box
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, BoxError> {
        let in_unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
        if ![left, top, right, bottom].into_iter().all(in_unit) {
            return Err(BoxError::OutOfRange);
        }
        if left >= right || top >= bottom {
            return Err(BoxError::Inverted);
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Parse `"l,t,r,b"`
    pub fn parse(value: &str) -> Result<Self, BoxError> {
        let tokens: Vec<&str> = value.split(',').map(str::trim).collect();
        if tokens.len() != 4 {
            return Err(BoxError::TokenCount(tokens.len()));
        }
        let mut coords = [0.0f32; 4];
        for (slot, token) in coords.iter_mut().zip(&tokens) {
            *slot = token
                .parse()
                .map_err(|_| BoxError::NotANumber(token.to_string()))?;
        }
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// Fraction of the tile covered by the box
    pub fn coverage(&self) -> f32 {
        (self.right - self.left) * (self.bottom - self.top)
    }

    /// Apply Tiled flip flags; the diagonal flip is applied first
    pub fn flipped(&self, flip: FlipFlags) -> Self {
        let mut b = *self;
        if flip.diagonal {
            b = CollisionBox {
                left: b.top,
                top: b.left,
                right: b.bottom,
                bottom: b.right,
            };
        }
        if flip.horizontal {
            b = CollisionBox {
                left: 1.0 - b.right,
                right: 1.0 - b.left,
                ..b
            };
        }
        if flip.vertical {
            b = CollisionBox {
                top: 1.0 - b.bottom,
                bottom: 1.0 - b.top,
                ..b
            };
        }
        b
    }

    /// Place the box in world space: `origin + box * tile_size`
    pub fn to_world(&self, origin: Point, tile_width: f32, tile_height: f32) -> Rect {
        Rect::new(
            origin.x + self.left * tile_width,
            origin.y + self.top * tile_height,
            origin.x + self.right * tile_width,
            origin.y + self.bottom * tile_height,
        )
    }
}

impl std::fmt::Display for CollisionBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pillar_box() {
        let b = CollisionBox::parse("0.6,0,1,0.9").unwrap();
        assert_eq!(b.left, 0.6);
        assert_eq!(b.bottom, 0.9);
        assert!((b.coverage() - 0.36).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(
            CollisionBox::parse(" 0, 0 ,1,1 ").unwrap(),
            CollisionBox::FULL
        );
    }

    #[test]
    fn test_rejects_malformed_boxes() {
        assert_eq!(
            CollisionBox::parse("0,0,1"),
            Err(BoxError::TokenCount(3))
        );
        assert_eq!(
            CollisionBox::parse("0,0,1.5,1"),
            Err(BoxError::OutOfRange)
        );
        assert_eq!(
            CollisionBox::parse("0.5,0,0.5,1"),
            Err(BoxError::Inverted)
        );
        assert_eq!(
            CollisionBox::parse("0,0,1,0"),
            Err(BoxError::Inverted)
        );
        assert!(matches!(
            CollisionBox::parse("0,a,1,1"),
            Err(BoxError::NotANumber(_))
        ));
        assert_eq!(
            CollisionBox::parse("-0.1,0,1,1"),
            Err(BoxError::OutOfRange)
        );
    }

    #[test]
    fn test_world_placement() {
        let b = CollisionBox::parse("0.6,0,1,0.9").unwrap();
        let rect = b.to_world(Point::new(32.0, 48.0), 16.0, 16.0);
        assert!((rect.min.x - 41.6).abs() < 1e-4);
        assert_eq!(rect.max.x, 48.0);
        assert_eq!(rect.min.y, 48.0);
        assert!((rect.max.y - 62.4).abs() < 1e-4);
    }

    #[test]
    fn test_horizontal_flip_mirrors_box() {
        let b = CollisionBox::parse("0.6,0,1,0.9").unwrap();
        let flipped = b.flipped(FlipFlags {
            horizontal: true,
            ..FlipFlags::default()
        });
        assert!((flipped.left - 0.0).abs() < 1e-6);
        assert!((flipped.right - 0.4).abs() < 1e-6);
        assert_eq!(flipped.top, 0.0);
        assert_eq!(flipped.bottom, 0.9);
    }

    #[test]
    fn test_diagonal_flip_transposes() {
        let b = CollisionBox::parse("0,0,0.45,0.95").unwrap();
        let flipped = b.flipped(FlipFlags {
            diagonal: true,
            ..FlipFlags::default()
        });
        assert_eq!(flipped.right, 0.95);
        assert_eq!(flipped.bottom, 0.45);
    }
}
