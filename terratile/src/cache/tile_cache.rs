//! The generic tile cache.

use super::chain::ProviderChain;
use super::r#trait::{BoxFuture, TileProvider};
use super::records::TileRecord;
use super::stats::{CacheStatistics, CacheStats};
use super::store::TileStore;
use super::types::{CacheLookup, InsertOutcome, LookupSource};
use crate::coord::TileIndex;
use crate::error::TerraError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// A cache of one record type over a [`TileStore`] table.
///
/// Lookups read the local row first and delegate misses to an optional
/// fallback chain. Fallback results are written back unless the cache is
/// read-only. Write-back is best effort: a failed write is logged, counted
/// and reported alongside the record, never instead of it.
pub struct TileCache<R: TileRecord> {
    name: String,
    store: Arc<TileStore>,
    fallback: Option<ProviderChain<R>>,
    read_only: bool,
    stats: Arc<CacheStats>,
}

impl<R: TileRecord> TileCache<R> {
    /// Creates a cache over `store` with no fallback.
    ///
    /// A read-only store makes the cache read-only.
    pub fn new(store: Arc<TileStore>) -> Self {
        let read_only = store.is_read_only();
        Self {
            name: R::TABLE.dir_name().to_string(),
            store,
            fallback: None,
            read_only,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Sets the chain consulted on a local miss.
    pub fn with_fallback(mut self, fallback: ProviderChain<R>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Disables all local writes.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Overrides the name used in logs and statistics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn store(&self) -> &Arc<TileStore> {
        &self.store
    }

    /// Live counters.
    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot()
    }

    /// Looks up a tile.
    ///
    /// # Errors
    ///
    /// Only [`TerraError::Cancelled`]. Corrupt rows, store read failures and
    /// fallback failures all degrade to a miss.
    pub async fn get(
        &self,
        tile: TileIndex,
        cancel: &CancellationToken,
    ) -> Result<CacheLookup<R>, TerraError> {
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }

        match self.store.read_record::<R>(&tile, cancel).await {
            Ok(Some(record)) => {
                self.stats.record_hit();
                trace!(cache = %self.name, tile = %tile, "Cache hit");
                return Ok(CacheLookup::Found {
                    record,
                    source: LookupSource::Hit,
                    write_error: None,
                });
            }
            Ok(None) => {}
            Err(TerraError::Cancelled) => return Err(TerraError::Cancelled),
            Err(e @ TerraError::Corrupt { .. }) => {
                self.stats.record_corrupt();
                warn!(cache = %self.name, tile = %tile, error = %e, "Corrupt row, treating as miss");
            }
            Err(e) => {
                warn!(cache = %self.name, tile = %tile, error = %e, "Store read failed, treating as miss");
            }
        }
        self.stats.record_miss();

        let Some(fallback) = &self.fallback else {
            return Ok(CacheLookup::NotFound);
        };
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }

        let record = match fallback.get(tile, cancel).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.stats.record_fallback_miss();
                return Ok(CacheLookup::NotFound);
            }
            Err(TerraError::Cancelled) => return Err(TerraError::Cancelled),
            Err(e) => {
                self.stats.record_fallback_miss();
                debug!(cache = %self.name, tile = %tile, error = %e, "Fallback failed, treating as miss");
                return Ok(CacheLookup::NotFound);
            }
        };
        self.stats.record_fallback_hit();

        let write_error = if self.read_only {
            None
        } else {
            self.write_back(&tile, &record, cancel).await?
        };

        Ok(CacheLookup::Found {
            record,
            source: LookupSource::Fallback,
            write_error,
        })
    }

    /// Writes a fallback result; only cancellation is returned as an error.
    async fn write_back(
        &self,
        tile: &TileIndex,
        record: &R,
        cancel: &CancellationToken,
    ) -> Result<Option<TerraError>, TerraError> {
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }
        match self.store.insert_record(tile, record, cancel).await {
            Ok(InsertOutcome::Inserted) => {
                self.stats.record_write();
                debug!(cache = %self.name, tile = %tile, "Wrote back fallback result");
                Ok(None)
            }
            Ok(InsertOutcome::AlreadyPresent) => {
                self.stats.record_write_conflict();
                trace!(cache = %self.name, tile = %tile, "Row already written by another writer");
                Ok(None)
            }
            Err(TerraError::Cancelled) => Err(TerraError::Cancelled),
            Err(e) => {
                self.stats.record_write_failure();
                warn!(cache = %self.name, tile = %tile, error = %e, "Write-back failed");
                Ok(Some(e))
            }
        }
    }

    /// Inserts a record directly.
    ///
    /// # Errors
    ///
    /// [`TerraError::Configuration`] if the cache is read-only, otherwise
    /// whatever the store reports.
    pub async fn insert(
        &self,
        tile: &TileIndex,
        record: &R,
        cancel: &CancellationToken,
    ) -> Result<InsertOutcome, TerraError> {
        if self.read_only {
            return Err(TerraError::Configuration(format!(
                "cache '{}' is read-only",
                self.name
            )));
        }
        let outcome = self.store.insert_record(tile, record, cancel).await?;
        match outcome {
            InsertOutcome::Inserted => self.stats.record_write(),
            InsertOutcome::AlreadyPresent => self.stats.record_write_conflict(),
        }
        Ok(outcome)
    }
}

impl<R: TileRecord> TileProvider<R> for TileCache<R> {
    fn get<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<R>, TerraError>> {
        Box::pin(async move { Ok(TileCache::get(self, tile, cancel).await?.into_record()) })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
