//! Geodetic and geocentric position types.

use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

/// Cartesian position in the ellipsoid's body-fixed frame, in meters.
///
/// X and Z are the equatorial axes, Y is the polar axis.
pub type GeocentricPosition = DVec3;

/// Canonicalizes a latitude/longitude pair.
///
/// Latitude overflowing a pole is mirrored back across it and the longitude
/// is shifted by π. The returned latitude is in [−π/2, π/2] and the
/// longitude in [−π, π).
fn canonicalize(latitude: f64, longitude: f64) -> (f64, f64) {
    let mut lat = wrap_pi(latitude);
    let mut lon = longitude;

    if lat > FRAC_PI_2 {
        lat = PI - lat;
        lon += PI;
    } else if lat < -FRAC_PI_2 {
        lat = -PI - lat;
        lon += PI;
    }

    (lat, wrap_pi(lon))
}

/// Wraps an angle into [−π, π).
fn wrap_pi(angle: f64) -> f64 {
    if (-PI..PI).contains(&angle) {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to exactly TAU for tiny negative inputs
    if wrapped >= PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Latitude/longitude on the reference ellipsoid, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPosition2d {
    latitude: f64,
    longitude: f64,
}

impl GeodeticPosition2d {
    /// Creates a canonicalized position from radians.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let (latitude, longitude) = canonicalize(latitude, longitude);
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a canonicalized position from decimal degrees.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude.to_radians(), longitude.to_radians())
    }

    /// Latitude in radians, in [−π/2, π/2].
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in radians, in [−π, π).
    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees.
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude.to_degrees()
    }

    /// Longitude in degrees.
    pub fn longitude_degrees(&self) -> f64 {
        self.longitude.to_degrees()
    }

    /// Lifts this position to 3D at the given height.
    pub fn with_height(self, height: f64) -> GeodeticPosition3d {
        GeodeticPosition3d {
            position: self,
            height,
        }
    }
}

impl fmt::Display for GeodeticPosition2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}°, {:.6}°)",
            self.latitude_degrees(),
            self.longitude_degrees()
        )
    }
}

/// Latitude/longitude plus height above the ellipsoid in meters.
///
/// Height sign is unrestricted: negative values lie below the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPosition3d {
    position: GeodeticPosition2d,
    height: f64,
}

impl GeodeticPosition3d {
    /// Creates a canonicalized position from radians and meters.
    pub fn new(latitude: f64, longitude: f64, height: f64) -> Self {
        GeodeticPosition2d::new(latitude, longitude).with_height(height)
    }

    /// Creates a canonicalized position from decimal degrees and meters.
    pub fn from_degrees(latitude: f64, longitude: f64, height: f64) -> Self {
        GeodeticPosition2d::from_degrees(latitude, longitude).with_height(height)
    }

    /// Latitude in radians.
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    /// Longitude in radians.
    #[inline]
    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }

    pub fn latitude_degrees(&self) -> f64 {
        self.position.latitude_degrees()
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.position.longitude_degrees()
    }

    /// Height in meters.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The surface position without height.
    #[inline]
    pub fn position(&self) -> GeodeticPosition2d {
        self.position
    }
}

impl From<GeodeticPosition2d> for GeodeticPosition3d {
    fn from(position: GeodeticPosition2d) -> Self {
        position.with_height(0.0)
    }
}

impl fmt::Display for GeodeticPosition3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.3} m", self.position, self.height)
    }
}

/// Local horizontal frame at a surface location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardinalDirections {
    pub north: DVec3,
    pub south: DVec3,
    pub east: DVec3,
    pub west: DVec3,
    /// Outward surface normal (local "up")
    pub normal: DVec3,
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl WorldBounds {
    /// Smallest box containing all given points, or `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Center of the box.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the box diagonal; radius of the enclosing sphere.
    pub fn radius(&self) -> f64 {
        (self.max - self.min).length() * 0.5
    }

    /// Returns true if the point lies inside or on the box.
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
