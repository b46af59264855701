//! terratile - geodesy, tile addressing and a persistent tile cache
//!
//! The crate is the data core of a globe renderer:
//!
//! - [`geodesy`]: ellipsoid math between geodetic and geocentric frames
//! - [`coord`]: Web Mercator pixel/tile addressing and quadkeys
//! - [`cache`]: an append-only tile store with fallback provider chains
//! - [`elevation`]: batch elevation lookup over heightmap tiles
//!
//! # High-Level API
//!
//! The [`service`] module wires everything from configuration:
//!
//! ```ignore
//! use std::sync::Arc;
//! use terratile::codec::ImageCrateCodec;
//! use terratile::config::TerraTileConfig;
//! use terratile::elevation::ElevationSample;
//! use terratile::service::TerraTileService;
//!
//! let service = TerraTileService::new(TerraTileConfig::load()?, Arc::new(ImageCrateCodec::new()))?;
//! let mut samples = vec![ElevationSample::from_degrees(46.55, 7.98)];
//! service.elevations(&mut samples, &cancel).await?;
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod coord;
pub mod elevation;
pub mod error;
pub mod geodesy;
pub mod logging;
pub mod provider;
pub mod raster;
pub mod service;

pub use error::TerraError;

/// Version of the terratile library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_modules_are_reachable() {
        use crate::coord::{geo_to_tile, TileIndex};
        use crate::geodesy::GeodeticPosition2d;

        let tile = geo_to_tile(&GeodeticPosition2d::from_degrees(40.7128, -74.0060), 16);
        assert_eq!(tile, TileIndex::new(16, 24640, 19295).unwrap());
    }
}
