//! Tile pyramid addressing
//!
//! Conversions between geodetic positions and spherical Web Mercator
//! pixel/tile coordinates, plus quadkey encoding of [`TileIndex`].
//! Every function is pure and parameterised by the level of detail.

mod types;

pub use types::{
    CoordError, GeoBoundingBox, PixelPosition, TileIndex, EARTH_RADIUS, MAX_LATITUDE, MAX_LEVEL,
    TILE_SIZE,
};

use crate::geodesy::GeodeticPosition2d;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Map width and height in pixels at `level`.
#[inline]
pub fn map_size_pixels(level: u8) -> u64 {
    (TILE_SIZE as u64) << level
}

/// Number of tiles along each axis at `level`.
#[inline]
pub fn map_size_tiles(level: u8) -> u64 {
    1u64 << level
}

/// Projects a geodetic position to global pixel coordinates.
///
/// Latitude is clamped to the Mercator range and the result to the map.
pub fn geo_to_pixel(position: &GeodeticPosition2d, level: u8) -> PixelPosition {
    let size = map_size_pixels(level) as f64;
    let lat = position.latitude().clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let lon = position.longitude().clamp(-PI, PI);

    let sin_lat = lat.sin();
    let x = (lon + PI) / TAU * size;
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;

    PixelPosition::new(x.clamp(0.0, size - 1.0), y.clamp(0.0, size - 1.0))
}

/// Inverse of [`geo_to_pixel`].
pub fn pixel_to_geo(pixel: &PixelPosition, level: u8) -> GeodeticPosition2d {
    let size = map_size_pixels(level) as f64;
    let x = pixel.x / size - 0.5;
    let y = 0.5 - pixel.y / size;

    let lat = FRAC_PI_2 - 2.0 * (-TAU * y).exp().atan();
    let lon = TAU * x;
    GeodeticPosition2d::new(lat, lon)
}

/// Meters of ground covered by one pixel at `latitude` (radians).
pub fn ground_resolution(latitude: f64, level: u8) -> f64 {
    let lat = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    lat.cos() * TAU * EARTH_RADIUS / map_size_pixels(level) as f64
}

/// Tile containing a global pixel position.
///
/// Positions outside the map are clamped onto the edge tiles.
pub fn pixel_to_tile(pixel: &PixelPosition, level: u8) -> TileIndex {
    let max = (map_size_tiles(level) - 1) as f64;
    let col = (pixel.x / TILE_SIZE as f64).floor().clamp(0.0, max) as u32;
    let row = (pixel.y / TILE_SIZE as f64).floor().clamp(0.0, max) as u32;
    TileIndex::new_unchecked(level, row, col)
}

/// Global pixel coordinates of a tile's north-west corner.
pub fn tile_pixel_origin(tile: &TileIndex) -> PixelPosition {
    PixelPosition::new(
        tile.col() as f64 * TILE_SIZE as f64,
        tile.row() as f64 * TILE_SIZE as f64,
    )
}

/// Tile containing a geodetic position at `level`.
#[inline]
pub fn geo_to_tile(position: &GeodeticPosition2d, level: u8) -> TileIndex {
    pixel_to_tile(&geo_to_pixel(position, level), level)
}

/// Geodetic rectangle from a tile's first to its last pixel, inclusive.
pub fn tile_bounds(tile: &TileIndex) -> GeoBoundingBox {
    let origin = tile_pixel_origin(tile);
    let last = (TILE_SIZE - 1) as f64;
    let north_west = pixel_to_geo(&origin, tile.level());
    let south_east = pixel_to_geo(
        &PixelPosition::new(origin.x + last, origin.y + last),
        tile.level(),
    );

    GeoBoundingBox::new_unchecked(north_west, south_east)
}

/// Tiles at `level` intersecting a bounding box, row-major from the
/// north-west corner.
///
/// Boxes crossing the antimeridian yield the western columns first, then
/// wrap to column 0.
pub fn tiles_covering(bounds: &GeoBoundingBox, level: u8) -> Vec<TileIndex> {
    let north_west = geo_to_tile(&bounds.north_west(), level);
    let south_east = geo_to_tile(&bounds.south_east(), level);
    let tiles = map_size_tiles(level) as u32;

    let columns: Vec<u32> = if bounds.crosses_antimeridian() && north_west.col() <= south_east.col() {
        // Both edges in one column: the box wraps all the way round
        (0..tiles).collect()
    } else if bounds.crosses_antimeridian() {
        (north_west.col()..tiles).chain(0..=south_east.col()).collect()
    } else {
        (north_west.col()..=south_east.col()).collect()
    };

    let rows = north_west.row()..=south_east.row();
    let mut result = Vec::with_capacity(columns.len() * rows.clone().count());
    for row in rows {
        for &col in &columns {
            result.push(TileIndex::new_unchecked(level, row, col));
        }
    }
    result
}
