//! Coordinate type definitions

use crate::error::TerraError;
use crate::geodesy::GeodeticPosition2d;
use std::f64::consts::TAU;
use std::fmt;
use thiserror::Error;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest supported level of detail.
///
/// Bounded by the quadkey length and by `u32` pixel arithmetic.
pub const MAX_LEVEL: u8 = 23;

/// Spherical Mercator earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Mercator latitude limit in radians (about 85.0511°).
pub const MAX_LATITUDE: f64 = 1.484_422_229_745_332_4;

/// A tile in the quadtree pyramid.
///
/// Row 0 is the northern edge and column 0 the antimeridian. Always valid:
/// `row` and `col` are below `2^level` and `level` is at most [`MAX_LEVEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    level: u8,
    row: u32,
    col: u32,
}

impl TileIndex {
    /// Creates a validated tile index.
    pub fn new(level: u8, row: u32, col: u32) -> Result<Self, CoordError> {
        if level > MAX_LEVEL {
            return Err(CoordError::InvalidLevel(level));
        }
        let tiles = 1u32 << level;
        if row >= tiles || col >= tiles {
            return Err(CoordError::InvalidTile { level, row, col });
        }
        Ok(Self { level, row, col })
    }

    /// The single level-0 tile covering the whole map.
    pub const fn root() -> Self {
        Self {
            level: 0,
            row: 0,
            col: 0,
        }
    }

    /// Caller guarantees the bounds.
    pub(crate) const fn new_unchecked(level: u8, row: u32, col: u32) -> Self {
        Self { level, row, col }
    }

    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline]
    pub fn row(&self) -> u32 {
        self.row
    }

    #[inline]
    pub fn col(&self) -> u32 {
        self.col
    }

    /// The tile one level up, or `None` for the root.
    pub fn parent(&self) -> Option<TileIndex> {
        if self.level == 0 {
            return None;
        }
        Some(Self::new_unchecked(
            self.level - 1,
            self.row / 2,
            self.col / 2,
        ))
    }

    /// The four tiles one level down, or `None` at [`MAX_LEVEL`].
    ///
    /// Ordered top-left, bottom-left, top-right, bottom-right.
    pub fn children(&self) -> Option<[TileIndex; 4]> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        let level = self.level + 1;
        let row = self.row * 2;
        let col = self.col * 2;
        Some([
            Self::new_unchecked(level, row, col),
            Self::new_unchecked(level, row + 1, col),
            Self::new_unchecked(level, row, col + 1),
            Self::new_unchecked(level, row + 1, col + 1),
        ])
    }

    /// Encodes this tile as a quadkey.
    ///
    /// One base-4 digit per level, coarsest first. Each digit carries the
    /// column bit as 1 and the row bit as 2. The root tile encodes as the
    /// empty string.
    pub fn to_quadkey(&self) -> String {
        let mut quadkey = String::with_capacity(self.level as usize);
        for i in (1..=self.level).rev() {
            let mask = 1u32 << (i - 1);
            let mut digit = b'0';
            if self.col & mask != 0 {
                digit += 1;
            }
            if self.row & mask != 0 {
                digit += 2;
            }
            quadkey.push(digit as char);
        }
        quadkey
    }

    /// Decodes a quadkey produced by [`TileIndex::to_quadkey`].
    ///
    /// The level is the key length.
    pub fn from_quadkey(quadkey: &str) -> Result<Self, CoordError> {
        if quadkey.len() > MAX_LEVEL as usize {
            return Err(CoordError::InvalidQuadkey(quadkey.to_string()));
        }

        let mut row = 0u32;
        let mut col = 0u32;
        for c in quadkey.chars() {
            let digit = match c {
                '0'..='3' => c as u32 - '0' as u32,
                _ => return Err(CoordError::InvalidQuadkey(quadkey.to_string())),
            };
            col = (col << 1) | (digit & 1);
            row = (row << 1) | (digit >> 1);
        }

        Ok(Self::new_unchecked(quadkey.len() as u8, row, col))
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}/{}/{}", self.level, self.row, self.col)
    }
}

/// Position in the global pixel space at some level of detail.
///
/// Origin is the north-west corner; `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

impl PixelPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geodetic rectangle given by its north-west and south-east corners.
///
/// Longitude ranges may cross the antimeridian, in which case `west` is
/// greater than `east`. Latitude ranges never cross a pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    north_west: GeodeticPosition2d,
    south_east: GeodeticPosition2d,
}

impl GeoBoundingBox {
    /// Creates a box from its corners.
    ///
    /// # Errors
    ///
    /// Returns [`TerraError::Geometry`] when the north edge lies south of the
    /// south edge, which would describe a range across a pole.
    pub fn new(
        north_west: GeodeticPosition2d,
        south_east: GeodeticPosition2d,
    ) -> Result<Self, TerraError> {
        if north_west.latitude() < south_east.latitude() {
            return Err(TerraError::Geometry(format!(
                "bounding box {} / {} would cross a pole",
                north_west, south_east
            )));
        }
        Ok(Self {
            north_west,
            south_east,
        })
    }

    /// Tile corners come from the Mercator inverse and are always ordered.
    pub(crate) fn new_unchecked(
        north_west: GeodeticPosition2d,
        south_east: GeodeticPosition2d,
    ) -> Self {
        Self {
            north_west,
            south_east,
        }
    }

    pub fn north_west(&self) -> GeodeticPosition2d {
        self.north_west
    }

    pub fn south_east(&self) -> GeodeticPosition2d {
        self.south_east
    }

    #[inline]
    pub fn north(&self) -> f64 {
        self.north_west.latitude()
    }

    #[inline]
    pub fn south(&self) -> f64 {
        self.south_east.latitude()
    }

    #[inline]
    pub fn west(&self) -> f64 {
        self.north_west.longitude()
    }

    #[inline]
    pub fn east(&self) -> f64 {
        self.south_east.longitude()
    }

    /// Returns true if the longitude range wraps through ±180°.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west() > self.east()
    }

    /// Longitude span in radians.
    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.east() - self.west() + TAU
        } else {
            self.east() - self.west()
        }
    }

    /// Latitude span in radians.
    pub fn height(&self) -> f64 {
        self.north() - self.south()
    }

    /// Midpoint of both ranges, wrapped across the antimeridian if needed.
    pub fn center(&self) -> GeodeticPosition2d {
        GeodeticPosition2d::new(
            (self.north() + self.south()) * 0.5,
            self.west() + self.width() * 0.5,
        )
    }

    /// Returns true if `longitude` falls inside the longitude range.
    pub fn contains_longitude(&self, longitude: f64) -> bool {
        if self.crosses_antimeridian() {
            longitude >= self.west() || longitude <= self.east()
        } else {
            (self.west()..=self.east()).contains(&longitude)
        }
    }

    /// Returns true if the position lies inside or on the box.
    pub fn contains(&self, position: &GeodeticPosition2d) -> bool {
        (self.south()..=self.north()).contains(&position.latitude())
            && self.contains_longitude(position.longitude())
    }
}

impl fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.north_west, self.south_east)
    }
}

/// Errors that can occur during tile addressing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Level is above [`MAX_LEVEL`]
    #[error("Invalid level: {0} (must be between 0 and {MAX_LEVEL})")]
    InvalidLevel(u8),

    /// Row or column is outside the `2^level` grid
    #[error("Invalid tile: row {row}, col {col} out of range at level {level}")]
    InvalidTile { level: u8, row: u32, col: u32 },

    /// Quadkey contains invalid characters or is too long
    #[error(
        "Invalid quadkey: '{0}' (must contain only digits 0-3 and length <= {MAX_LEVEL})"
    )]
    InvalidQuadkey(String),
}

impl From<CoordError> for TerraError {
    fn from(err: CoordError) -> Self {
        TerraError::Geometry(err.to_string())
    }
}
