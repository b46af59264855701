//! Tests for ellipsoid geodesy

use super::*;
use crate::coord::GeoBoundingBox;
use crate::error::TerraError;
use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_C: f64 = 6_356_752.314_245;

fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(2.0 * PI);
    d.min(2.0 * PI - d)
}

fn assert_round_trip(ellipsoid: &Ellipsoid, heights: &[f64]) {
    let mut lat = -89.0;
    while lat <= 89.0 {
        let mut lon = -179.0;
        while lon <= 179.0 {
            for &h in heights {
                let input = GeodeticPosition3d::from_degrees(lat, lon, h);
                let world = ellipsoid.to_geocentric(&input);
                let output = ellipsoid.to_geodetic(world).unwrap();

                assert!(
                    (output.latitude() - input.latitude()).abs() < 1e-6,
                    "lat {} lon {} h {}: latitude {} != {}",
                    lat,
                    lon,
                    h,
                    output.latitude(),
                    input.latitude()
                );
                assert!(
                    angle_diff(output.longitude(), input.longitude()) < 1e-6,
                    "lat {} lon {} h {}: longitude mismatch",
                    lat,
                    lon,
                    h
                );
                assert!(
                    (output.height() - h).abs() < 1.0,
                    "lat {} lon {} h {}: height {}",
                    lat,
                    lon,
                    h,
                    output.height()
                );
            }
            lon += 23.0;
        }
        lat += 11.0;
    }
}

#[test]
fn test_new_rejects_non_positive_radii() {
    assert!(matches!(
        Ellipsoid::new(1.0, 0.0, 1.0),
        Err(TerraError::Configuration(_))
    ));
    assert!(matches!(
        Ellipsoid::new(-1.0, 1.0, 1.0),
        Err(TerraError::Configuration(_))
    ));
    assert!(matches!(
        Ellipsoid::new(f64::NAN, 1.0, 1.0),
        Err(TerraError::Configuration(_))
    ));
}

#[test]
fn test_set_radii_recomputes_derived_values() {
    let mut ellipsoid = Ellipsoid::unit_sphere();
    ellipsoid.set_radii(2.0, 3.0, 2.0).unwrap();
    assert_eq!(ellipsoid.radii(), DVec3::new(2.0, 3.0, 2.0));

    let pole = ellipsoid.to_geocentric(&GeodeticPosition3d::new(FRAC_PI_2, 0.0, 0.0));
    assert!((pole.y - 3.0).abs() < 1e-12);

    assert!(ellipsoid.set_radii(0.0, 1.0, 1.0).is_err());
    // Failed update leaves the ellipsoid untouched
    assert_eq!(ellipsoid.radii(), DVec3::new(2.0, 3.0, 2.0));
}

#[test]
fn test_wgs84_equator_prime_meridian() {
    let wgs84 = Ellipsoid::wgs84();
    let p = wgs84.to_geocentric(&GeodeticPosition3d::from_degrees(0.0, 0.0, 0.0));

    assert!((p.x - WGS84_A).abs() < 1e-6);
    assert!(p.y.abs() < 1e-6);
    assert!(p.z.abs() < 1e-6);
}

#[test]
fn test_wgs84_north_pole() {
    let wgs84 = Ellipsoid::wgs84();
    let p = wgs84.to_geocentric(&GeodeticPosition3d::from_degrees(90.0, 0.0, 0.0));

    assert!(p.x.abs() < 1e-6);
    assert!((p.y - WGS84_C).abs() < 1e-6);
    assert!(p.z.abs() < 1e-6);
}

#[test]
fn test_longitude_ninety_points_along_z() {
    let wgs84 = Ellipsoid::wgs84();
    let p = wgs84.to_geocentric(&GeodeticPosition3d::from_degrees(0.0, 90.0, 100.0));

    assert!(p.x.abs() < 1e-6);
    assert!((p.z - (WGS84_A + 100.0)).abs() < 1e-6);
}

#[test]
fn test_round_trip_wgs84() {
    assert_round_trip(
        &Ellipsoid::wgs84(),
        &[-5_000.0, 0.0, 1_000.0, 35_786_000.0 / 4.0, 9_999_000.0],
    );
}

#[test]
fn test_round_trip_custom_spheroid() {
    // Mars-sized oblate spheroid; radii come from the instance, not WGS84
    let mars = Ellipsoid::new(3_396_190.0, 3_376_200.0, 3_396_190.0).unwrap();
    assert_round_trip(&mars, &[-2_000.0, 0.0, 20_000.0, 5_000_000.0]);
}

#[test]
fn test_round_trip_unit_sphere() {
    assert_round_trip(&Ellipsoid::unit_sphere(), &[-0.5, 0.0, 0.25, 10.0]);
}

#[test]
fn test_round_trip_triaxial() {
    let triaxial = Ellipsoid::new(6_378_137.0, 6_356_752.0, 6_370_000.0).unwrap();
    assert_round_trip(
        &triaxial,
        &[-1_000.0, 0.0, 50_000.0, 1_000_000.0, 5_000_000.0, 9_999_000.0],
    );
}

#[test]
fn test_round_trip_prolate_spheroid() {
    // Polar radius longer than the equatorial one
    let prolate = Ellipsoid::new(6_356_752.0, 6_378_137.0, 6_356_752.0).unwrap();
    assert_round_trip(
        &prolate,
        &[-1_000.0, 0.0, 50_000.0, 1_000_000.0, 9_999_000.0],
    );
}

#[test]
fn test_to_geodetic_pole() {
    let wgs84 = Ellipsoid::wgs84();
    let result = wgs84
        .to_geodetic(DVec3::new(0.0, WGS84_C + 500.0, 0.0))
        .unwrap();

    assert!((result.latitude() - FRAC_PI_2).abs() < 1e-9);
    assert!((result.height() - 500.0).abs() < 1e-6);
}

#[test]
fn test_to_geodetic_origin_is_geometry_error() {
    let result = Ellipsoid::wgs84().to_geodetic(DVec3::ZERO);
    assert!(matches!(result, Err(TerraError::Geometry(_))));
}

#[test]
fn test_surface_normal_is_unit_length() {
    let ellipsoids = [
        Ellipsoid::wgs84(),
        Ellipsoid::unit_sphere(),
        Ellipsoid::new(3.0, 1.0, 2.0).unwrap(),
    ];

    for ellipsoid in &ellipsoids {
        for lat in (-90..=90).step_by(15) {
            for lon in (-180..180).step_by(20) {
                let pos = GeodeticPosition2d::from_degrees(lat as f64, lon as f64);
                let n = ellipsoid.surface_normal(&pos);
                assert!((n.length() - 1.0).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn test_surface_point_lies_on_surface() {
    let ellipsoid = Ellipsoid::new(3.0, 1.0, 2.0).unwrap();
    let normal = ellipsoid.surface_normal(&GeodeticPosition2d::from_degrees(30.0, 60.0));

    // Length of the normal does not matter
    let p1 = ellipsoid.surface_point(normal);
    let p2 = ellipsoid.surface_point(normal * 7.5);

    assert!(ellipsoid.is_on_surface(p1, 1e-12));
    assert!((p1 - p2).length() < 1e-12);
}

#[test]
fn test_project_to_surface_lands_on_surface() {
    let ellipsoids = [
        Ellipsoid::wgs84(),
        Ellipsoid::new(3.0, 1.0, 2.0).unwrap(),
    ];
    let points = [
        DVec3::new(7_000_000.0, 1_000_000.0, -3_000_000.0),
        DVec3::new(-20_000_000.0, 40_000_000.0, 5.0),
        DVec3::new(1_000.0, -2_000.0, 500.0),
        DVec3::new(1e-3, 2e-3, -5e-4),
        DVec3::new(0.0, 0.0, 1.0),
    ];

    for ellipsoid in &ellipsoids {
        for &p in &points {
            let q = ellipsoid.project_to_surface(p).unwrap();
            assert!(
                ellipsoid.is_on_surface(q, 1e-6),
                "projection of {} is off surface: {}",
                p,
                q
            );
        }
    }
}

/// Unit directions spread over the sphere, plus the three axes.
fn sweep_directions() -> Vec<DVec3> {
    let count = 60;
    let golden = PI * (3.0 - 5f64.sqrt());
    let mut directions: Vec<DVec3> = (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / count as f64;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f64;
            DVec3::new(r * theta.cos(), y, r * theta.sin())
        })
        .collect();
    directions.extend([DVec3::X, DVec3::Y, DVec3::Z, DVec3::new(1.0, 0.0, 1.0).normalize()]);
    directions
}

#[test]
fn test_project_to_surface_from_any_depth() {
    let ellipsoids = [
        Ellipsoid::wgs84(),
        Ellipsoid::new(3.0, 1.0, 2.0).unwrap(),
    ];

    for ellipsoid in &ellipsoids {
        for exponent in -6..=4 {
            let magnitude = 10f64.powi(exponent);
            for direction in sweep_directions() {
                let p = direction * magnitude;
                let q = ellipsoid.project_to_surface(p).unwrap();
                assert!(q.is_finite(), "projection of {} is not finite: {}", p, q);
                assert!(
                    ellipsoid.is_on_surface(q, 1e-6),
                    "projection of {} is off surface: {}",
                    p,
                    q
                );
            }
        }
    }
}

#[test]
fn test_project_to_surface_near_center_on_axis() {
    let wgs84 = Ellipsoid::wgs84();

    let polar = wgs84.project_to_surface(DVec3::new(0.0, 1e-6, 0.0)).unwrap();
    assert!((polar - DVec3::new(0.0, WGS84_C, 0.0)).length() < 1e-6);

    let equatorial = wgs84.project_to_surface(DVec3::new(-1e-6, 0.0, 0.0)).unwrap();
    assert!((equatorial - DVec3::new(-WGS84_A, 0.0, 0.0)).length() < 1e-6);
}

#[test]
fn test_to_geodetic_deep_inside_is_finite() {
    let wgs84 = Ellipsoid::wgs84();
    let result = wgs84.to_geodetic(DVec3::new(10.0, 20.0, -5.0)).unwrap();

    assert!(result.latitude().is_finite());
    assert!(result.longitude().is_finite());
    assert!(result.height() < -6_000_000.0);
}

#[test]
fn test_project_to_surface_keeps_surface_points() {
    let wgs84 = Ellipsoid::wgs84();
    let surface = wgs84.to_geocentric(&GeodeticPosition3d::from_degrees(47.0, 8.0, 0.0));
    let projected = wgs84.project_to_surface(surface).unwrap();

    assert!((surface - projected).length() < 1e-6);
}

#[test]
fn test_project_to_surface_origin_fails() {
    assert!(matches!(
        Ellipsoid::wgs84().project_to_surface(DVec3::ZERO),
        Err(TerraError::Geometry(_))
    ));
}

#[test]
fn test_cardinal_directions_at_origin() {
    let wgs84 = Ellipsoid::wgs84();
    let dirs = wgs84
        .cardinal_directions(&GeodeticPosition2d::new(0.0, 0.0))
        .unwrap();

    assert!((dirs.normal - DVec3::X).length() < 1e-12);
    assert!((dirs.north - DVec3::Y).length() < 1e-12);
    assert!((dirs.east - DVec3::Z).length() < 1e-12);
    assert!((dirs.south + dirs.north).length() < 1e-12);
    assert!((dirs.west + dirs.east).length() < 1e-12);
}

#[test]
fn test_cardinal_directions_are_orthonormal() {
    let wgs84 = Ellipsoid::wgs84();
    let dirs = wgs84
        .cardinal_directions(&GeodeticPosition2d::from_degrees(45.0, 30.0))
        .unwrap();

    assert!((dirs.north.length() - 1.0).abs() < 1e-12);
    assert!((dirs.east.length() - 1.0).abs() < 1e-12);
    assert!(dirs.north.dot(dirs.normal).abs() < 1e-12);
    assert!(dirs.east.dot(dirs.normal).abs() < 1e-12);
    assert!(dirs.east.dot(dirs.north).abs() < 1e-12);
    // North has a positive polar component away from the pole
    assert!(dirs.north.y > 0.0);
}

#[test]
fn test_cardinal_directions_at_pole_fails() {
    let wgs84 = Ellipsoid::wgs84();
    let result = wgs84.cardinal_directions(&GeodeticPosition2d::new(FRAC_PI_2, 0.0));
    assert!(matches!(result, Err(TerraError::Geometry(_))));

    let result = wgs84.cardinal_directions(&GeodeticPosition2d::new(-FRAC_PI_2, 1.0));
    assert!(matches!(result, Err(TerraError::Geometry(_))));
}

#[test]
fn test_bounding_volume_contains_patch() {
    let wgs84 = Ellipsoid::wgs84();
    let bounds = GeoBoundingBox::new(
        GeodeticPosition2d::from_degrees(10.0, -20.0),
        GeodeticPosition2d::from_degrees(-5.0, 15.0),
    )
    .unwrap();

    let volume = wgs84.bounding_volume(&bounds, 0.0, 1_000.0).unwrap();

    // The equator/prime meridian point is the X extreme of this patch
    assert!((volume.max.x - (WGS84_A + 1_000.0)).abs() < 1e-6);

    for lat in [-5.0, 0.0, 4.0, 10.0] {
        for lon in [-20.0, -3.0, 0.0, 15.0] {
            let p = wgs84.to_geocentric(&GeodeticPosition3d::from_degrees(lat, lon, 500.0));
            assert!(volume.contains(p), "({}, {}) not in volume", lat, lon);
        }
    }
}

#[test]
fn test_bounding_volume_whole_world() {
    let wgs84 = Ellipsoid::wgs84();
    let bounds = GeoBoundingBox::new(
        GeodeticPosition2d::new(FRAC_PI_2, -PI),
        GeodeticPosition2d::new(-FRAC_PI_2, PI - 1e-12),
    )
    .unwrap();

    let volume = wgs84.bounding_volume(&bounds, 0.0, 0.0).unwrap();

    assert!((volume.max.x - WGS84_A).abs() < 1e-3);
    assert!((volume.min.x + WGS84_A).abs() < 1e-3);
    assert!((volume.max.y - WGS84_C).abs() < 1e-3);
    assert!((volume.min.y + WGS84_C).abs() < 1e-3);
    assert!((volume.max.z - WGS84_A).abs() < 1e-3);
    assert!((volume.min.z + WGS84_A).abs() < 1e-3);
}
