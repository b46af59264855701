//! Provider chain: local store, network source, and composites of the two.
//!
//! A chain is a closed set of variants behind the one [`TileProvider`]
//! capability. Composites consult the primary first and the fallback on a
//! miss, optionally writing fallback results into a store:
//!
//! ```text
//! Composite ─┬─ primary:  Local(store)
//!            └─ fallback: Network(source) ──write-back──► store
//! ```

use super::r#trait::{BoxFuture, TileProvider};
use super::records::TileRecord;
use super::store::TileStore;
use super::types::InsertOutcome;
use crate::coord::TileIndex;
use crate::error::TerraError;
use crate::provider::TileSource;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Serves records from a [`TileStore`] only.
///
/// Corrupt rows are logged and reported as absent.
#[derive(Debug, Clone)]
pub struct LocalStoreProvider {
    store: Arc<TileStore>,
}

impl LocalStoreProvider {
    pub fn new(store: Arc<TileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TileStore> {
        &self.store
    }
}

impl<R: TileRecord> TileProvider<R> for LocalStoreProvider {
    fn get<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<R>, TerraError>> {
        Box::pin(async move {
            match self.store.read_record::<R>(&tile, cancel).await {
                Err(e @ TerraError::Corrupt { .. }) => {
                    warn!(table = %R::TABLE, tile = %tile, error = %e, "Corrupt row treated as miss");
                    Ok(None)
                }
                other => other,
            }
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Adapts a raw-byte [`TileSource`] into a record provider.
///
/// Bytes are parsed with [`TileRecord::decode`], so a source must serve the
/// same row layout the store uses. For blob records that is simply the
/// encoded payload.
pub struct NetworkProvider<R> {
    source: Arc<dyn TileSource>,
    _record: PhantomData<fn() -> R>,
}

impl<R> NetworkProvider<R> {
    pub fn new(source: Arc<dyn TileSource>) -> Self {
        Self {
            source,
            _record: PhantomData,
        }
    }
}

impl<R: TileRecord> TileProvider<R> for NetworkProvider<R> {
    fn get<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<R>, TerraError>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(TerraError::Cancelled);
            }
            let Some(bytes) = self.source.fetch_tile(tile, cancel).await? else {
                trace!(source = self.source.name(), tile = %tile, "Source has no tile");
                return Ok(None);
            };

            R::decode(bytes)
                .map(Some)
                .map_err(|e| TerraError::corrupt(tile.to_quadkey(), e.to_string()))
        })
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}

/// The closed set of provider shapes.
pub enum ProviderChain<R: TileRecord> {
    /// Local store only.
    Local(LocalStoreProvider),
    /// A remote byte source.
    Network(NetworkProvider<R>),
    /// Primary first, fallback on a miss.
    Composite {
        primary: Box<ProviderChain<R>>,
        fallback: Box<ProviderChain<R>>,
        /// Where fallback results are written, if anywhere.
        write_back: Option<Arc<TileStore>>,
    },
}

impl<R: TileRecord> ProviderChain<R> {
    /// A chain reading one store.
    pub fn local(store: Arc<TileStore>) -> Self {
        ProviderChain::Local(LocalStoreProvider::new(store))
    }

    /// A chain fetching from one source.
    pub fn network(source: Arc<dyn TileSource>) -> Self {
        ProviderChain::Network(NetworkProvider::new(source))
    }

    /// Puts `fallback` behind this chain.
    pub fn with_fallback(self, fallback: ProviderChain<R>, write_back: Option<Arc<TileStore>>) -> Self {
        ProviderChain::Composite {
            primary: Box::new(self),
            fallback: Box::new(fallback),
            write_back,
        }
    }

    /// Number of leaf providers in the chain.
    pub fn depth(&self) -> usize {
        match self {
            ProviderChain::Local(_) | ProviderChain::Network(_) => 1,
            ProviderChain::Composite {
                primary, fallback, ..
            } => primary.depth() + fallback.depth(),
        }
    }
}

/// Resolves through one link, degrading every error except cancellation
/// to a miss.
async fn resolve_or_miss<R: TileRecord>(
    link: &ProviderChain<R>,
    tile: TileIndex,
    cancel: &CancellationToken,
) -> Result<Option<R>, TerraError> {
    match link.get(tile, cancel).await {
        Ok(found) => Ok(found),
        Err(TerraError::Cancelled) => Err(TerraError::Cancelled),
        Err(e) => {
            debug!(provider = link.name(), tile = %tile, error = %e, "Provider failed, treating as miss");
            Ok(None)
        }
    }
}

impl<R: TileRecord> TileProvider<R> for ProviderChain<R> {
    fn get<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<R>, TerraError>> {
        match self {
            ProviderChain::Local(local) => TileProvider::<R>::get(local, tile, cancel),
            ProviderChain::Network(network) => network.get(tile, cancel),
            ProviderChain::Composite {
                primary,
                fallback,
                write_back,
            } => Box::pin(async move {
                if let Some(record) = resolve_or_miss(primary, tile, cancel).await? {
                    return Ok(Some(record));
                }
                if cancel.is_cancelled() {
                    return Err(TerraError::Cancelled);
                }

                let Some(record) = resolve_or_miss(fallback, tile, cancel).await? else {
                    return Ok(None);
                };

                if let Some(store) = write_back.as_ref().filter(|s| !s.is_read_only()) {
                    match store.insert_record(&tile, &record, cancel).await {
                        Ok(InsertOutcome::Inserted) => {
                            debug!(tile = %tile, table = %R::TABLE, "Wrote back fallback result");
                        }
                        Ok(InsertOutcome::AlreadyPresent) => {}
                        Err(TerraError::Cancelled) => return Err(TerraError::Cancelled),
                        Err(e) => {
                            warn!(tile = %tile, table = %R::TABLE, error = %e, "Write-back failed");
                        }
                    }
                }
                Ok(Some(record))
            }),
        }
    }

    fn name(&self) -> &str {
        match self {
            ProviderChain::Local(local) => TileProvider::<R>::name(local),
            ProviderChain::Network(network) => network.name(),
            ProviderChain::Composite { .. } => "composite",
        }
    }
}
