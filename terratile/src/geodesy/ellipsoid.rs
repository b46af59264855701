//! Reference ellipsoid and geodetic/geocentric conversions.

use super::types::{
    CardinalDirections, GeocentricPosition, GeodeticPosition2d, GeodeticPosition3d, WorldBounds,
};
use crate::coord::GeoBoundingBox;
use crate::error::TerraError;
use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI};

/// Convergence threshold for [`Ellipsoid::project_to_surface`].
///
/// Applied to the dimensionless residual of the ellipsoid equation.
pub const PROJECTION_TOLERANCE: f64 = 1e-12;

/// Iteration cap for [`Ellipsoid::project_to_surface`].
const MAX_PROJECTION_ITERATIONS: usize = 128;

/// Horizontal magnitude below which the north direction is undefined.
const POLE_EPSILON: f64 = 1e-12;

/// A triaxial reference ellipsoid with Y as the polar axis.
///
/// The frame is left-handed: longitude grows from +X towards +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
    one_over_radii_squared: DVec3,
    radii_to_the_fourth: DVec3,
}

impl Ellipsoid {
    /// WGS84 equatorial radius in meters.
    pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;
    /// WGS84 polar radius in meters.
    pub const WGS84_SEMI_MINOR: f64 = 6_356_752.314_245;

    /// Creates an ellipsoid from its three radii.
    ///
    /// # Errors
    ///
    /// Returns [`TerraError::Configuration`] if any radius is not a positive
    /// finite number.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, TerraError> {
        let radii = Self::validate(DVec3::new(x, y, z))?;
        Ok(Self::derive(radii))
    }

    /// The WGS84 ellipsoid.
    pub fn wgs84() -> Self {
        Self::derive(DVec3::new(
            Self::WGS84_SEMI_MAJOR,
            Self::WGS84_SEMI_MINOR,
            Self::WGS84_SEMI_MAJOR,
        ))
    }

    /// The unit sphere.
    pub fn unit_sphere() -> Self {
        Self::derive(DVec3::ONE)
    }

    /// Replaces the radii, recomputing all cached derived values.
    pub fn set_radii(&mut self, x: f64, y: f64, z: f64) -> Result<(), TerraError> {
        let radii = Self::validate(DVec3::new(x, y, z))?;
        *self = Self::derive(radii);
        Ok(())
    }

    fn validate(radii: DVec3) -> Result<DVec3, TerraError> {
        if !radii.is_finite() || radii.min_element() <= 0.0 {
            return Err(TerraError::Configuration(format!(
                "ellipsoid radii must be positive and finite, got ({}, {}, {})",
                radii.x, radii.y, radii.z
            )));
        }
        Ok(radii)
    }

    fn derive(radii: DVec3) -> Self {
        let radii_squared = radii * radii;
        Self {
            radii,
            radii_squared,
            one_over_radii_squared: DVec3::ONE / radii_squared,
            radii_to_the_fourth: radii_squared * radii_squared,
        }
    }

    /// The three radii.
    #[inline]
    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    /// Equatorial radius used by the closed-form inverse.
    #[inline]
    pub fn semi_major_axis(&self) -> f64 {
        self.radii.x
    }

    /// Polar radius.
    #[inline]
    pub fn semi_minor_axis(&self) -> f64 {
        self.radii.y
    }

    /// Returns true when both equatorial radii are equal.
    pub fn is_spheroid(&self) -> bool {
        self.radii.x == self.radii.z
    }

    /// Outward unit normal at a geodetic location.
    pub fn surface_normal(&self, position: &GeodeticPosition2d) -> DVec3 {
        let (sin_lat, cos_lat) = position.latitude().sin_cos();
        let (sin_lon, cos_lon) = position.longitude().sin_cos();
        DVec3::new(cos_lat * cos_lon, sin_lat, cos_lat * sin_lon).normalize()
    }

    /// Gradient normal of the ellipsoid level surface through `point`.
    ///
    /// Zero for the origin.
    pub fn surface_normal_at_point(&self, point: GeocentricPosition) -> DVec3 {
        (point * self.one_over_radii_squared).normalize_or_zero()
    }

    /// Surface point whose normal is `normal`.
    ///
    /// `normal` may have any non-zero length but must be a true surface
    /// normal direction; arbitrary vectors do not land on the surface
    /// point with that normal.
    pub fn surface_point(&self, normal: DVec3) -> GeocentricPosition {
        let k = self.radii_squared * normal;
        let gamma = k.dot(normal).sqrt();
        k / gamma
    }

    /// Converts a geodetic position to geocentric coordinates.
    pub fn to_geocentric(&self, position: &GeodeticPosition3d) -> GeocentricPosition {
        let normal = self.surface_normal(&position.position());
        self.surface_point(normal) + normal * position.height()
    }

    /// Returns true if `point` satisfies the ellipsoid equation within `tolerance`.
    pub fn is_on_surface(&self, point: GeocentricPosition, tolerance: f64) -> bool {
        ((point * point * self.one_over_radii_squared).element_sum() - 1.0).abs() <= tolerance
    }

    /// Projects a point onto the surface along the geodetic normal.
    ///
    /// Solves for the scale factor α such that `x / (1 + α/R²)` lies on the
    /// ellipsoid. The solve runs in the shifted variable `t = α + m`, where
    /// `m` is the smallest `R²` among the axes the point has a component
    /// on, so the valid branch is `t > 0` and the dominant denominator is
    /// `t` itself with no cancellation near the center. The residual is
    /// convex and decreasing in `t`; Newton steps that leave the current
    /// bracket are replaced by a geometric bisection.
    ///
    /// # Errors
    ///
    /// Returns [`TerraError::Geometry`] for the exact origin, which has no
    /// surface direction, for non-finite input, and if the iteration fails
    /// to converge.
    pub fn project_to_surface(
        &self,
        point: GeocentricPosition,
    ) -> Result<GeocentricPosition, TerraError> {
        if !point.is_finite() {
            return Err(TerraError::Geometry(format!(
                "cannot project non-finite point {}",
                point
            )));
        }
        if point == DVec3::ZERO {
            return Err(TerraError::Geometry(
                "cannot project the ellipsoid center onto its surface".to_string(),
            ));
        }

        let x = point.to_array();
        let radii = self.radii.to_array();
        let radii_squared = self.radii_squared.to_array();
        let axes: Vec<usize> = (0..3).filter(|&i| x[i] != 0.0).collect();

        let m = axes
            .iter()
            .map(|&i| radii_squared[i])
            .fold(f64::INFINITY, f64::min);
        let offset: [f64; 3] = std::array::from_fn(|i| radii_squared[i] - m);

        // Residual of the ellipsoid equation and its derivative in t
        let residual = |t: f64| {
            axes.iter().fold((-1.0, 0.0), |(s, ds), &i| {
                let u = offset[i] + t;
                let w = x[i] * radii[i] / u;
                (s + w * w, ds - 2.0 * w * w / u)
            })
        };
        let surface = |t: f64| {
            DVec3::from_array(std::array::from_fn(|i| {
                if x[i] == 0.0 {
                    0.0
                } else {
                    x[i] * radii_squared[i] / (offset[i] + t)
                }
            }))
        };

        // residual(lo) >= 0 and residual(hi) < 0
        let mut lo = axes
            .iter()
            .map(|&i| x[i].abs() * radii[i] - offset[i])
            .fold(0.0, f64::max);
        let max_radius = axes.iter().map(|&i| radii[i]).fold(0.0, f64::max);
        let mut hi = 2.0 * max_radius * point.length();

        let beta = 1.0 / (point * point * self.one_over_radii_squared).element_sum().sqrt();
        let n = (point * self.one_over_radii_squared * beta).length();
        let mut t = m + (1.0 - beta) * (point.length() / n);
        if !(t > lo && t < hi) {
            t = (lo * hi).sqrt();
        }

        for _ in 0..MAX_PROJECTION_ITERATIONS {
            let (s, ds) = residual(t);
            if s.abs() < PROJECTION_TOLERANCE {
                return Ok(surface(t));
            }
            if s > 0.0 {
                lo = t;
            } else {
                hi = t;
            }

            let next = t - s / ds;
            t = if next > lo && next < hi {
                next
            } else {
                (lo * hi).sqrt()
            };
        }

        let q = surface(t);
        if q.is_finite() && self.is_on_surface(q, PROJECTION_TOLERANCE.sqrt()) {
            return Ok(q);
        }
        Err(TerraError::Geometry(format!(
            "surface projection of {} did not converge",
            point
        )))
    }

    /// Converts a geocentric point to geodetic coordinates.
    ///
    /// Latitude uses two Bowring iterations on this ellipsoid's own
    /// semi-major and semi-minor axes. Triaxial ellipsoids have no
    /// rotational symmetry for Bowring to exploit, so they read the
    /// geodetic normal of the projected surface point instead. Height is
    /// the signed distance to the projected surface point.
    ///
    /// # Errors
    ///
    /// Returns [`TerraError::Geometry`] for the ellipsoid center.
    pub fn to_geodetic(&self, point: GeocentricPosition) -> Result<GeodeticPosition3d, TerraError> {
        let surface = self.project_to_surface(point)?;

        let (latitude, longitude) = if self.is_spheroid() {
            self.bowring_lat_lon(point)
        } else {
            let normal = self.surface_normal_at_point(surface);
            (normal.y.clamp(-1.0, 1.0).asin(), normal.z.atan2(normal.x))
        };

        let offset = point - surface;
        let height = if offset.dot(point) < 0.0 {
            -offset.length()
        } else {
            offset.length()
        };

        Ok(GeodeticPosition3d::new(latitude, longitude, height))
    }

    fn bowring_lat_lon(&self, point: GeocentricPosition) -> (f64, f64) {
        let a = self.semi_major_axis();
        let c = self.semi_minor_axis();
        let a2 = a * a;
        let c2 = c * c;
        let e2 = (a2 - c2) / a2;
        let ep2 = (a2 - c2) / c2;

        let p = (point.x * point.x + point.z * point.z).sqrt();
        let y = point.y;
        let longitude = point.z.atan2(point.x);

        let mut beta = (a * y).atan2(c * p);
        let mut latitude = 0.0;
        for _ in 0..2 {
            let (sin_b, cos_b) = beta.sin_cos();
            latitude = (y + ep2 * c * sin_b.powi(3)).atan2(p - e2 * a * cos_b.powi(3));
            beta = (c * latitude.sin()).atan2(a * latitude.cos());
        }

        (latitude.clamp(-FRAC_PI_2, FRAC_PI_2), longitude)
    }

    /// North/south/east/west tangent directions plus the surface normal.
    ///
    /// # Errors
    ///
    /// Returns [`TerraError::Geometry`] at the exact poles, where north is
    /// undefined.
    pub fn cardinal_directions(
        &self,
        position: &GeodeticPosition2d,
    ) -> Result<CardinalDirections, TerraError> {
        let normal = self.surface_normal(position);
        let up = DVec3::Y;
        let tangent_up = up - normal * up.dot(normal);

        if tangent_up.length() < POLE_EPSILON {
            return Err(TerraError::Geometry(format!(
                "north is undefined at the pole {}",
                position
            )));
        }

        let north = tangent_up.normalize();
        let east = normal.cross(north).normalize();

        Ok(CardinalDirections {
            north,
            south: -north,
            east,
            west: -east,
            normal,
        })
    }

    /// World-space box enclosing a geodetic rectangle between two heights.
    ///
    /// Each axis extreme of the surface patch lies on a corner, on the
    /// equator, or on one of the four cardinal meridians, so sampling those
    /// candidates inside the rectangle is exact for spheroids.
    pub fn bounding_volume(
        &self,
        bounds: &GeoBoundingBox,
        min_height: f64,
        max_height: f64,
    ) -> Result<WorldBounds, TerraError> {
        let north = bounds.north();
        let south = bounds.south();

        let mut latitudes = vec![north, south];
        if south < 0.0 && north > 0.0 {
            latitudes.push(0.0);
        }

        let mut longitudes = vec![bounds.west(), bounds.east(), bounds.center().longitude()];
        for meridian in [-PI, -FRAC_PI_2, 0.0, FRAC_PI_2] {
            if bounds.contains_longitude(meridian) {
                longitudes.push(meridian);
            }
        }

        let mut points = Vec::with_capacity(latitudes.len() * longitudes.len() * 2);
        for &lat in &latitudes {
            for &lon in &longitudes {
                for height in [min_height, max_height] {
                    points.push(self.to_geocentric(&GeodeticPosition3d::new(lat, lon, height)));
                }
            }
        }

        WorldBounds::from_points(points)
            .ok_or_else(|| TerraError::Geometry("empty bounding volume".to_string()))
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}
