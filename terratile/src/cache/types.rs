//! Core types for the tile cache.

use crate::error::TerraError;
use std::fmt;

/// The four tables of the persistent tile store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileTable {
    TileImages,
    Heightmaps,
    AttributeMasks,
    Meshes,
}

impl TileTable {
    /// Every table, in on-disk creation order.
    pub const ALL: [TileTable; 4] = [
        TileTable::TileImages,
        TileTable::Heightmaps,
        TileTable::AttributeMasks,
        TileTable::Meshes,
    ];

    /// Directory name of this table under the store root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            TileTable::TileImages => "tile_images",
            TileTable::Heightmaps => "heightmaps",
            TileTable::AttributeMasks => "attribute_masks",
            TileTable::Meshes => "meshes",
        }
    }
}

impl fmt::Display for TileTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Result of an insert-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This writer created the row.
    Inserted,
    /// The row already existed; nothing was written.
    AlreadyPresent,
}

/// Where a found record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Served from the local store.
    Hit,
    /// Resolved by the fallback provider chain.
    Fallback,
}

/// Outcome of [`TileCache::get`](super::TileCache::get).
#[derive(Debug)]
pub enum CacheLookup<R> {
    Found {
        record: R,
        source: LookupSource,
        /// Advisory: the write-back of a fallback result failed.
        write_error: Option<TerraError>,
    },
    NotFound,
}

impl<R> CacheLookup<R> {
    pub fn is_found(&self) -> bool {
        matches!(self, CacheLookup::Found { .. })
    }

    /// The record, if any, discarding provenance.
    pub fn into_record(self) -> Option<R> {
        match self {
            CacheLookup::Found { record, .. } => Some(record),
            CacheLookup::NotFound => None,
        }
    }

    pub fn source(&self) -> Option<LookupSource> {
        match self {
            CacheLookup::Found { source, .. } => Some(*source),
            CacheLookup::NotFound => None,
        }
    }
}
