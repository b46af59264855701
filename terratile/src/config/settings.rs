//! Configuration structs.

use super::defaults::*;
use crate::coord::MAX_LEVEL;
use crate::elevation::GroupingStrategy;
use std::path::{Path, PathBuf};

/// Where and how the persistent tile store is opened.
///
/// # Example
///
/// ```
/// use terratile::config::StoreConfig;
///
/// let config = StoreConfig::new()
///     .with_root("/var/cache/tiles")
///     .with_max_concurrent_io(1);
/// assert_eq!(config.max_concurrent_io(), 1);
/// assert!(!config.read_only());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    root: PathBuf,
    read_only: bool,
    max_concurrent_io: usize,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store root directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Serve existing rows only, never writing.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Set how many store operations may run at once. 1 serializes the
    /// store behind a single-writer lock.
    pub fn with_max_concurrent_io(mut self, n: usize) -> Self {
        self.max_concurrent_io = n.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn max_concurrent_io(&self) -> usize {
        self.max_concurrent_io
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_dir(),
            read_only: false,
            max_concurrent_io: DEFAULT_MAX_CONCURRENT_IO,
        }
    }
}

/// Remote tile sources used as cache fallbacks.
///
/// Each URL is a template with `{quadkey}`, `{z}`, `{x}` and `{y}`
/// placeholders. A table without a URL has no network fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    timeout_secs: u64,
    imagery_url: Option<String>,
    heightmap_url: Option<String>,
    mask_url: Option<String>,
    mesh_url: Option<String>,
}

impl NetworkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout in seconds. Default: 30 seconds.
    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    pub fn with_imagery_url(mut self, url: impl Into<String>) -> Self {
        self.imagery_url = Some(url.into());
        self
    }

    pub fn with_heightmap_url(mut self, url: impl Into<String>) -> Self {
        self.heightmap_url = Some(url.into());
        self
    }

    pub fn with_mask_url(mut self, url: impl Into<String>) -> Self {
        self.mask_url = Some(url.into());
        self
    }

    pub fn with_mesh_url(mut self, url: impl Into<String>) -> Self {
        self.mesh_url = Some(url.into());
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn imagery_url(&self) -> Option<&str> {
        self.imagery_url.as_deref()
    }

    pub fn heightmap_url(&self) -> Option<&str> {
        self.heightmap_url.as_deref()
    }

    pub fn mask_url(&self) -> Option<&str> {
        self.mask_url.as_deref()
    }

    pub fn mesh_url(&self) -> Option<&str> {
        self.mesh_url.as_deref()
    }

    /// True if any table has a remote source.
    pub fn has_sources(&self) -> bool {
        self.imagery_url.is_some()
            || self.heightmap_url.is_some()
            || self.mask_url.is_some()
            || self.mesh_url.is_some()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_NETWORK_TIMEOUT_SECS,
            imagery_url: None,
            heightmap_url: None,
            mask_url: None,
            mesh_url: None,
        }
    }
}

/// Elevation query defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElevationConfig {
    default_level: u8,
    strategy: GroupingStrategy,
    scratch_buffers: usize,
}

impl ElevationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level queries group at. Clamped to the deepest level.
    pub fn with_default_level(mut self, level: u8) -> Self {
        self.default_level = level.min(MAX_LEVEL);
        self
    }

    pub fn with_strategy(mut self, strategy: GroupingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the number of pooled decode buffers. At least one.
    pub fn with_scratch_buffers(mut self, n: usize) -> Self {
        self.scratch_buffers = n.max(1);
        self
    }

    pub fn default_level(&self) -> u8 {
        self.default_level
    }

    pub fn strategy(&self) -> GroupingStrategy {
        self.strategy
    }

    pub fn scratch_buffers(&self) -> usize {
        self.scratch_buffers
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_ELEVATION_LEVEL,
            strategy: DEFAULT_GROUPING_STRATEGY,
            scratch_buffers: DEFAULT_SCRATCH_BUFFERS,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerraTileConfig {
    pub store: StoreConfig,
    pub network: NetworkConfig,
    pub elevation: ElevationConfig,
}

impl TerraTileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    pub fn with_elevation(mut self, elevation: ElevationConfig) -> Self {
        self.elevation = elevation;
        self
    }
}
