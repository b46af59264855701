//! Batch elevation lookup over heightmap tiles.
//!
//! Callers own a slice of [`ElevationSample`]s; a query fills each
//! sample's `elevation` in place, addressed by index only. Samples are
//! grouped by tile so each heightmap is fetched and decoded once per batch.

mod grouping;
mod heightmap;
mod query;

pub use grouping::{
    group_by_fewest_tiles, group_by_tile, GroupingStrategy, TileGroup, MAX_FEWEST_GROUPS,
};
pub use heightmap::{decode_heightmap, Heightmap};
pub use query::{ElevationQuery, QueryReport, DEFAULT_ELEVATION, DEFAULT_QUERY_LEVEL};

use crate::cache::BoxFuture;
use crate::error::TerraError;
use crate::geodesy::GeodeticPosition2d;
use tokio_util::sync::CancellationToken;

/// A point to look up and, once resolved, its elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    pub position: GeodeticPosition2d,
    pub elevation: f64,
}

impl ElevationSample {
    /// A sample at `position` with elevation zero.
    pub fn new(position: GeodeticPosition2d) -> Self {
        Self {
            position,
            elevation: 0.0,
        }
    }

    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(GeodeticPosition2d::from_degrees(latitude, longitude))
    }
}

/// An alternate source of elevations, called with a whole sub-batch.
pub trait ElevationProvider: Send + Sync {
    /// Fills `elevation` for every sample in `samples`.
    fn fetch_elevations<'a>(
        &'a self,
        samples: &'a mut [ElevationSample],
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), TerraError>>;
}
