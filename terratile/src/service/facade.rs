//! terratile service facade implementation.

use crate::cache::{
    AttributeMaskRecord, CacheStatistics, HeightmapRecord, ImageRecord, MeshRecord,
    ProviderChain, TileCache, TileProvider, TileRecord, TileStore, TileTable,
};
use crate::codec::ImageCodec;
use crate::config::TerraTileConfig;
use crate::elevation::{ElevationProvider, ElevationQuery, ElevationSample, QueryReport};
use crate::error::TerraError;
use crate::provider::{AsyncReqwestClient, UrlTemplateSource};
use crate::raster::BufferPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wires the store, caches and elevation query from configuration.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use terratile::codec::ImageCrateCodec;
/// use terratile::config::TerraTileConfig;
/// use terratile::service::TerraTileService;
///
/// let service = TerraTileService::new(TerraTileConfig::load()?, Arc::new(ImageCrateCodec::new()))?;
/// let report = service.elevations(&mut samples, &cancel).await?;
/// ```
pub struct TerraTileService {
    config: TerraTileConfig,
    store: Arc<TileStore>,
    imagery: Arc<TileCache<ImageRecord>>,
    heightmaps: Arc<TileCache<HeightmapRecord>>,
    masks: Arc<TileCache<AttributeMaskRecord>>,
    meshes: Arc<TileCache<MeshRecord>>,
    elevation: ElevationQuery,
    codec: Arc<dyn ImageCodec>,
}

impl TerraTileService {
    /// Create a service from configuration.
    ///
    /// # Errors
    ///
    /// [`TerraError::Configuration`] if the store cannot be opened for
    /// writing or the HTTP client cannot be built.
    pub fn new(config: TerraTileConfig, codec: Arc<dyn ImageCodec>) -> Result<Self, TerraError> {
        let store_config = &config.store;
        let store = Arc::new(if store_config.read_only() {
            TileStore::open_read_only(store_config.root(), store_config.max_concurrent_io())
        } else {
            TileStore::open(store_config.root(), store_config.max_concurrent_io())?
        });

        let client = if config.network.has_sources() {
            Some(
                AsyncReqwestClient::with_timeout(config.network.timeout_secs())
                    .map_err(|e| TerraError::Configuration(e.to_string()))?,
            )
        } else {
            None
        };
        let client = client.as_ref();

        let imagery = Arc::new(build_cache(&store, client, config.network.imagery_url()));
        let heightmaps = Arc::new(build_cache(&store, client, config.network.heightmap_url()));
        let masks = Arc::new(build_cache(&store, client, config.network.mask_url()));
        let meshes = Arc::new(build_cache(&store, client, config.network.mesh_url()));

        let heightmap_provider: Arc<dyn TileProvider<HeightmapRecord>> = heightmaps.clone();
        let elevation = ElevationQuery::new(
            heightmap_provider,
            Arc::clone(&codec),
            BufferPool::new(config.elevation.scratch_buffers()),
        )
        .with_defaults(config.elevation.default_level(), config.elevation.strategy());

        info!(
            root = %store.root().display(),
            read_only = store.is_read_only(),
            network = config.network.has_sources(),
            level = config.elevation.default_level(),
            strategy = %config.elevation.strategy(),
            "terratile service ready"
        );

        Ok(Self {
            config,
            store,
            imagery,
            heightmaps,
            masks,
            meshes,
            elevation,
            codec,
        })
    }

    /// Adds a provider for elevation groups with no heightmap tile.
    pub fn with_elevation_fallback(self, fallback: Arc<dyn ElevationProvider>) -> Self {
        Self {
            elevation: self.elevation.with_fallback(fallback),
            ..self
        }
    }

    pub fn config(&self) -> &TerraTileConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TileStore> {
        &self.store
    }

    pub fn imagery(&self) -> &Arc<TileCache<ImageRecord>> {
        &self.imagery
    }

    pub fn heightmaps(&self) -> &Arc<TileCache<HeightmapRecord>> {
        &self.heightmaps
    }

    pub fn masks(&self) -> &Arc<TileCache<AttributeMaskRecord>> {
        &self.masks
    }

    pub fn meshes(&self) -> &Arc<TileCache<MeshRecord>> {
        &self.meshes
    }

    pub fn elevation(&self) -> &ElevationQuery {
        &self.elevation
    }

    pub fn codec(&self) -> &Arc<dyn ImageCodec> {
        &self.codec
    }

    /// Fills elevations at the configured level and strategy.
    pub async fn elevations(
        &self,
        samples: &mut [ElevationSample],
        cancel: &CancellationToken,
    ) -> Result<QueryReport, TerraError> {
        self.elevation
            .query(
                samples,
                self.config.elevation.default_level(),
                self.config.elevation.strategy(),
                cancel,
            )
            .await
    }

    /// Statistics for every table's cache.
    pub fn statistics(&self) -> Vec<(TileTable, CacheStatistics)> {
        vec![
            (TileTable::TileImages, self.imagery.statistics()),
            (TileTable::Heightmaps, self.heightmaps.statistics()),
            (TileTable::AttributeMasks, self.masks.statistics()),
            (TileTable::Meshes, self.meshes.statistics()),
        ]
    }

    /// Human-readable statistics for every cache.
    pub fn format_statistics(&self) -> String {
        self.statistics()
            .iter()
            .map(|(table, stats)| stats.format(table.dir_name()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A cache for one table, with a network fallback when a URL is set.
fn build_cache<R: TileRecord>(
    store: &Arc<TileStore>,
    client: Option<&AsyncReqwestClient>,
    url: Option<&str>,
) -> TileCache<R> {
    let cache = TileCache::new(Arc::clone(store));
    match (client, url) {
        (Some(client), Some(url)) => {
            let source = UrlTemplateSource::new(client.clone(), R::TABLE.dir_name(), url);
            cache.with_fallback(ProviderChain::network(Arc::new(source)))
        }
        _ => cache,
    }
}
