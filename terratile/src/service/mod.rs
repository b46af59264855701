//! High-level service facade.
//!
//! [`TerraTileService`] builds every component from a
//! [`TerraTileConfig`](crate::config::TerraTileConfig) and hands them out
//! explicitly; nothing in the crate is a global.

mod facade;

pub use facade::TerraTileService;
