//! Batch elevation queries.

use super::grouping::{GroupingStrategy, TileGroup};
use super::heightmap::{decode_heightmap, Heightmap};
use super::{ElevationProvider, ElevationSample};
use crate::cache::{BoxFuture, HeightmapRecord, TileProvider};
use crate::codec::ImageCodec;
use crate::coord::{geo_to_pixel, tile_pixel_origin, MAX_LEVEL};
use crate::error::TerraError;
use crate::raster::{BufferPool, PooledBuffer, Raster};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default level for queries that do not name one.
pub const DEFAULT_QUERY_LEVEL: u8 = 12;

/// Elevation written for points no source could resolve.
pub const DEFAULT_ELEVATION: f64 = 0.0;

/// What a batch query did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryReport {
    /// Level the samples were grouped at.
    pub level: u8,
    /// Number of tile groups.
    pub groups: usize,
    /// Groups resolved from a heightmap tile.
    pub tiles_hit: usize,
    /// Groups resolved by the fallback elevation provider.
    pub fallback_groups: usize,
    /// Points set to [`DEFAULT_ELEVATION`].
    pub defaulted_points: usize,
}

/// Fills elevation samples from heightmap tiles.
///
/// Samples are grouped by tile and each group is resolved with one tile
/// fetch. Groups whose tile is absent or undecodable go to the fallback
/// elevation provider as one sub-batch, or default to zero. Only
/// cancellation fails a batch.
pub struct ElevationQuery {
    heightmaps: Arc<dyn TileProvider<HeightmapRecord>>,
    codec: Arc<dyn ImageCodec>,
    fallback: Option<Arc<dyn ElevationProvider>>,
    buffers: BufferPool,
    default_level: u8,
    strategy: GroupingStrategy,
}

impl ElevationQuery {
    pub fn new(
        heightmaps: Arc<dyn TileProvider<HeightmapRecord>>,
        codec: Arc<dyn ImageCodec>,
        buffers: BufferPool,
    ) -> Self {
        Self {
            heightmaps,
            codec,
            fallback: None,
            buffers,
            default_level: DEFAULT_QUERY_LEVEL,
            strategy: GroupingStrategy::default(),
        }
    }

    /// Sets the provider consulted for groups with no heightmap.
    pub fn with_fallback(mut self, fallback: Arc<dyn ElevationProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Sets the level and strategy used through [`ElevationProvider`].
    pub fn with_defaults(mut self, level: u8, strategy: GroupingStrategy) -> Self {
        self.default_level = level.min(MAX_LEVEL);
        self.strategy = strategy;
        self
    }

    pub fn default_level(&self) -> u8 {
        self.default_level
    }

    pub fn strategy(&self) -> GroupingStrategy {
        self.strategy
    }

    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }

    /// Fills `samples[i].elevation` for every sample.
    ///
    /// # Errors
    ///
    /// Only [`TerraError::Cancelled`]. Samples already written stay
    /// written.
    pub async fn query(
        &self,
        samples: &mut [ElevationSample],
        level: u8,
        strategy: GroupingStrategy,
        cancel: &CancellationToken,
    ) -> Result<QueryReport, TerraError> {
        let (level, groups) = strategy.group(samples, level.min(MAX_LEVEL));
        let mut report = QueryReport {
            level,
            groups: groups.len(),
            ..QueryReport::default()
        };
        debug!(
            points = samples.len(),
            groups = groups.len(),
            level,
            strategy = %strategy,
            "Elevation query"
        );

        for group in &groups {
            if cancel.is_cancelled() {
                return Err(TerraError::Cancelled);
            }

            if let Some(heightmap) = self.load_heightmap(group, cancel).await? {
                sample_group(&heightmap, group, samples, cancel)?;
                report.tiles_hit += 1;
                continue;
            }

            if self.delegate(group, samples, cancel).await? {
                report.fallback_groups += 1;
            } else {
                for &index in &group.indices {
                    samples[index].elevation = DEFAULT_ELEVATION;
                }
                report.defaulted_points += group.len();
            }
        }

        if report.defaulted_points > 0 {
            debug!(
                defaulted = report.defaulted_points,
                points = samples.len(),
                "Elevation query defaulted unresolved points"
            );
        }
        Ok(report)
    }

    /// Fetches and decodes a group's tile; absent or corrupt tiles are
    /// `None`.
    async fn load_heightmap(
        &self,
        group: &TileGroup,
        cancel: &CancellationToken,
    ) -> Result<Option<Heightmap<PooledBuffer>>, TerraError> {
        let record = match self.heightmaps.get(group.tile, cancel).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(TerraError::Cancelled) => return Err(TerraError::Cancelled),
            Err(e) => {
                debug!(tile = %group.tile, error = %e, "Heightmap fetch failed");
                return Ok(None);
            }
        };

        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }
        let buffer = self.buffers.acquire(cancel).await?;

        match decode_heightmap(record, group.tile, Arc::clone(&self.codec), buffer).await {
            Ok(heightmap) => Ok(Some(heightmap)),
            Err(e) => {
                warn!(tile = %group.tile, error = %e, "Undecodable heightmap treated as absent");
                Ok(None)
            }
        }
    }

    /// Hands a group to the fallback provider as one sub-batch.
    ///
    /// Returns false if there is no fallback or it failed.
    async fn delegate(
        &self,
        group: &TileGroup,
        samples: &mut [ElevationSample],
        cancel: &CancellationToken,
    ) -> Result<bool, TerraError> {
        let Some(fallback) = &self.fallback else {
            return Ok(false);
        };
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }

        let mut sub_batch: Vec<ElevationSample> =
            group.indices.iter().map(|&index| samples[index]).collect();

        match fallback.fetch_elevations(&mut sub_batch, cancel).await {
            Ok(()) => {
                for (&index, resolved) in group.indices.iter().zip(&sub_batch) {
                    samples[index].elevation = resolved.elevation;
                }
                Ok(true)
            }
            Err(TerraError::Cancelled) => Err(TerraError::Cancelled),
            Err(e) => {
                warn!(tile = %group.tile, points = group.len(), error = %e, "Fallback elevation provider failed");
                Ok(false)
            }
        }
    }
}

/// Interpolates every point of a group from its heightmap.
fn sample_group<B: AsRef<Raster<u16>>>(
    heightmap: &Heightmap<B>,
    group: &TileGroup,
    samples: &mut [ElevationSample],
    cancel: &CancellationToken,
) -> Result<(), TerraError> {
    let level = group.tile.level();
    let origin = tile_pixel_origin(&group.tile);

    for &index in &group.indices {
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }
        let pixel = geo_to_pixel(&samples[index].position, level);
        samples[index].elevation = heightmap.sample_tile_pixel(pixel.x - origin.x, pixel.y - origin.y);
    }
    Ok(())
}

impl ElevationProvider for ElevationQuery {
    fn fetch_elevations<'a>(
        &'a self,
        samples: &'a mut [ElevationSample],
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), TerraError>> {
        Box::pin(async move {
            self.query(samples, self.default_level, self.strategy, cancel)
                .await
                .map(|_| ())
        })
    }
}
