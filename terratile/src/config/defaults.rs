//! Default configuration values.

use crate::cache::DEFAULT_STORE_CONCURRENCY;
use crate::elevation::{GroupingStrategy, DEFAULT_QUERY_LEVEL};
use crate::provider::DEFAULT_TIMEOUT_SECS;
use std::path::PathBuf;

/// Concurrent store operations.
pub const DEFAULT_MAX_CONCURRENT_IO: usize = DEFAULT_STORE_CONCURRENCY;

/// Network request timeout in seconds.
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT_SECS;

/// Level elevation queries group at when none is given.
pub const DEFAULT_ELEVATION_LEVEL: u8 = DEFAULT_QUERY_LEVEL;

/// Scratch heightmap buffers, which bounds concurrent decodes.
pub const DEFAULT_SCRATCH_BUFFERS: usize = 4;

/// Grouping used when none is configured.
pub const DEFAULT_GROUPING_STRATEGY: GroupingStrategy = GroupingStrategy::PerTile;

/// Store root: the platform cache directory plus `terratile`.
pub fn default_store_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("terratile")
}
