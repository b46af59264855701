//! Ellipsoid geodesy.
//!
//! Conversions between geodetic positions (latitude, longitude, height) and
//! the ellipsoid's body-fixed Cartesian frame, surface projection, and local
//! tangent frames. Everything here is pure math on `f64`.
//!
//! # Example
//!
//! ```
//! use terratile::geodesy::{Ellipsoid, GeodeticPosition3d};
//!
//! let wgs84 = Ellipsoid::wgs84();
//! let origin = wgs84.to_geocentric(&GeodeticPosition3d::from_degrees(0.0, 0.0, 0.0));
//! assert!((origin.x - 6_378_137.0).abs() < 1e-6);
//! ```

mod ellipsoid;
mod types;

pub use ellipsoid::{Ellipsoid, PROJECTION_TOLERANCE};
pub use types::{
    CardinalDirections, GeocentricPosition, GeodeticPosition2d, GeodeticPosition3d, WorldBounds,
};

#[cfg(test)]
mod tests;
