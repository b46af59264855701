//! Configuration types for terratile components.
//!
//! Each struct groups the parameters of one concern, with defaults and
//! `with_*` builders. [`TerraTileConfig`] combines them and loads from an
//! INI file with `[store]`, `[network]` and `[elevation]` sections.
//!
//! # Example
//!
//! ```
//! use terratile::config::{ElevationConfig, StoreConfig, TerraTileConfig};
//! use terratile::elevation::GroupingStrategy;
//!
//! let config = TerraTileConfig::new()
//!     .with_store(StoreConfig::new().with_root("/tmp/terratile"))
//!     .with_elevation(ElevationConfig::new().with_strategy(GroupingStrategy::FewestTiles));
//! assert_eq!(config.elevation.strategy(), GroupingStrategy::FewestTiles);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    default_store_dir, DEFAULT_ELEVATION_LEVEL, DEFAULT_GROUPING_STRATEGY,
    DEFAULT_MAX_CONCURRENT_IO, DEFAULT_NETWORK_TIMEOUT_SECS, DEFAULT_SCRATCH_BUFFERS,
};
pub use file::{config_directory, config_file_path, ConfigError};
pub use settings::{ElevationConfig, NetworkConfig, StoreConfig, TerraTileConfig};
