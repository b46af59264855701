//! Append-only tile cache.
//!
//! Four record types share one persistent [`TileStore`]. A [`TileCache`]
//! serves one of them: local rows first, then an optional
//! [`ProviderChain`] fallback whose results are written back
//! insert-if-absent.

mod access;
mod chain;
mod path;
mod records;
mod stats;
mod store;
mod tile_cache;
mod r#trait;
mod types;

pub use access::{StoreAccess, StorePermit, DEFAULT_STORE_CONCURRENCY};
pub use chain::{LocalStoreProvider, NetworkProvider, ProviderChain};
pub use r#trait::{BoxFuture, EmptyProvider, TileProvider};
pub use records::{
    AttributeMaskRecord, HeightmapRecord, ImageRecord, MeshRecord, RecordError, TileRecord,
};
pub use stats::{CacheStatistics, CacheStats};
pub use store::TileStore;
pub use tile_cache::TileCache;
pub use types::{CacheLookup, InsertOutcome, LookupSource, TileTable};

// Re-export path utilities for convenience
pub use path::{level_directory, row_path, table_directory, ROW_EXTENSION};
