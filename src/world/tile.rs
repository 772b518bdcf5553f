use std::fmt;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::spatial::BBox;

/// Display palette for freshly minted tiles.
pub const PALETTE: [&str; 10] = [
    "#FF6B6B", // Soft Red
    "#4ECDC4", // Turquoise
    "#45B7D1", // Sky Blue
    "#FFA07A", // Light Salmon
    "#98D8C8", // Mint
    "#F7B267", // Mellow Apricot
    "#A06CD5", // Soft Purple
    "#7FBC8C", // Sage Green
    "#F67280", // Pastel Red
    "#6A0572", // Deep Purple
];

/// Colour given to the origin tile of a new game.
pub const ORIGIN_COLOUR: &str = "#FFF";

/// Tolerance, as a fraction of the pitch, when checking a coordinate lies on
/// the grid.
const GRID_EPSILON: f64 = 1e-6;

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Normal,
    /// Transient placement target, never permanent map content.
    Option,
}

// === Identity ===

/// Positional tile identity, always `"x,y"` of the integer world coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(String);

impl TileId {
    /// Derive the id for a grid-aligned world position.
    ///
    /// Coordinates are rounded, so callers must have validated alignment.
    pub fn from_position(position: DVec2) -> Self {
        let x = position.x.round() as i64;
        let y = position.y.round() as i64;
        TileId(format!("{},{}", x, y))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque display colour carried through the core untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(String);

impl Colour {
    pub fn new(value: impl Into<String>) -> Self {
        Colour(value.into())
    }

    /// Pick a palette colour.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Colour::new(PALETTE[rng.gen_range(0..PALETTE.len())])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// === Errors ===

/// Reasons a tile cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum TileError {
    NonFinitePosition { x: f64, y: f64 },
    OffGrid { x: f64, y: f64, pitch: f64 },
    InvalidSize(f64),
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileError::NonFinitePosition { x, y } => {
                write!(f, "Tile position must be finite, got ({}, {})", x, y)
            }
            TileError::OffGrid { x, y, pitch } => write!(
                f,
                "Tile position ({}, {}) is not aligned to the {}-unit grid",
                x, y, pitch
            ),
            TileError::InvalidSize(size) => {
                write!(f, "Tile size must be finite and > 0, got {}", size)
            }
        }
    }
}

impl std::error::Error for TileError {}

// === Tile ===

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub position: DVec2,
    pub size: f64,
    pub kind: TileKind,
    /// Ids of the tiles currently present on the four grid sides.
    pub adjacent: Vec<TileId>,
    pub selected: bool,
    pub colour: Colour,
}

impl Tile {
    /// Build a tile at a grid-aligned world position.
    pub fn new(
        position: DVec2,
        kind: TileKind,
        colour: Colour,
        size: f64,
        pitch: f64,
    ) -> Result<Self, TileError> {
        if !position.is_finite() {
            return Err(TileError::NonFinitePosition {
                x: position.x,
                y: position.y,
            });
        }
        if !size.is_finite() || size <= 0.0 {
            return Err(TileError::InvalidSize(size));
        }
        if !is_aligned(position.x, pitch) || !is_aligned(position.y, pitch) {
            return Err(TileError::OffGrid {
                x: position.x,
                y: position.y,
                pitch,
            });
        }

        // Snap away floating point drift and negative zero.
        let position = (position / pitch).round() * pitch + DVec2::ZERO;

        Ok(Self {
            id: TileId::from_position(position),
            position,
            size,
            kind,
            adjacent: Vec::new(),
            selected: false,
            colour,
        })
    }

    /// Footprint of the tile: a square of side `size` centred on `position`.
    pub fn bbox(&self) -> BBox {
        BBox::around(self.position, self.size)
    }

    pub fn is_option(&self) -> bool {
        self.kind == TileKind::Option
    }
}

/// Distance to the nearest grid line is measured in world units, so the
/// tolerance does not grow with the coordinate.
fn is_aligned(value: f64, pitch: f64) -> bool {
    let snapped = (value / pitch).round() * pitch;
    (value - snapped).abs() <= GRID_EPSILON * pitch
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn normal_at(x: f64, y: f64) -> Result<Tile, TileError> {
        Tile::new(
            DVec2::new(x, y),
            TileKind::Normal,
            Colour::new("#FFF"),
            100.0,
            100.0,
        )
    }

    #[test]
    fn id_is_derived_from_position() {
        let tile = normal_at(0.0, 100.0).unwrap();
        assert_eq!(tile.id.as_str(), "0,100");

        let tile = normal_at(-300.0, 200.0).unwrap();
        assert_eq!(tile.id.as_str(), "-300,200");
    }

    #[test]
    fn negative_zero_produces_canonical_id() {
        let tile = normal_at(-0.0, -0.0).unwrap();
        assert_eq!(tile.id.as_str(), "0,0");
        assert_eq!(tile.id, TileId::from_position(DVec2::ZERO));
    }

    #[test]
    fn non_finite_position_rejected() {
        let err = normal_at(f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, TileError::NonFinitePosition { .. }));

        let err = normal_at(0.0, f64::INFINITY).unwrap_err();
        assert!(matches!(err, TileError::NonFinitePosition { .. }));
    }

    #[test]
    fn off_grid_position_rejected() {
        let err = normal_at(50.0, 0.0).unwrap_err();
        assert_eq!(
            err,
            TileError::OffGrid {
                x: 50.0,
                y: 0.0,
                pitch: 100.0
            }
        );
        assert!(err.to_string().contains("not aligned"));
    }

    #[test]
    fn off_grid_far_from_origin_rejected() {
        for (x, y) in [(50_000_050.0, 0.0), (123_456_789.0, 0.0), (0.0, -7_000_000_001.0)] {
            let err = normal_at(x, y).unwrap_err();
            assert!(
                matches!(err, TileError::OffGrid { .. }),
                "({}, {}) should be off grid, got {:?}",
                x,
                y,
                err
            );
        }

        let far = normal_at(50_000_000.0, -7_000_000_000.0).unwrap();
        assert_eq!(far.id.as_str(), "50000000,-7000000000");
    }

    #[test]
    fn tiny_drift_is_snapped_to_grid() {
        let tile = normal_at(100.000_000_01, 199.999_999_99).unwrap();
        assert_eq!(tile.position, DVec2::new(100.0, 200.0));
        assert_eq!(tile.id.as_str(), "100,200");
    }

    #[test]
    fn invalid_size_rejected() {
        let err = Tile::new(
            DVec2::ZERO,
            TileKind::Normal,
            Colour::new("#FFF"),
            0.0,
            100.0,
        )
        .unwrap_err();
        assert_eq!(err, TileError::InvalidSize(0.0));
    }

    #[test]
    fn bbox_is_centred_on_position() {
        let tile = normal_at(100.0, 0.0).unwrap();
        let bbox = tile.bbox();
        assert_eq!(bbox, BBox::new(50.0, -50.0, 150.0, 50.0));
    }

    #[test]
    fn random_colour_comes_from_palette() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let colour = Colour::random(&mut rng);
            assert!(PALETTE.contains(&colour.as_str()), "{} not in palette", colour);
        }
    }

    #[test]
    fn tile_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TileKind::Option).unwrap();
        assert_eq!(json, "\"option\"");
    }
}
