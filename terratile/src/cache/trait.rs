//! Tile provider capability.

use super::records::TileRecord;
use crate::coord::TileIndex;
use crate::error::TerraError;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Boxed `Send` future, so providers stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can resolve a tile to a record.
///
/// `Ok(None)` means the tile is absent at this provider. Errors other than
/// [`TerraError::Cancelled`] are treated as absence by callers that have
/// somewhere else to look.
///
/// # Example
///
/// ```
/// use terratile::cache::{MeshRecord, TileProvider};
/// use terratile::coord::TileIndex;
/// use tokio_util::sync::CancellationToken;
///
/// async fn mesh_or_empty(provider: &dyn TileProvider<MeshRecord>, tile: TileIndex) -> Vec<u8> {
///     let cancel = CancellationToken::new();
///     match provider.get(tile, &cancel).await {
///         Ok(Some(mesh)) => mesh.blob,
///         _ => Vec::new(),
///     }
/// }
/// ```
pub trait TileProvider<R: TileRecord>: Send + Sync {
    /// Resolves one tile.
    fn get<'a>(
        &'a self,
        tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<R>, TerraError>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Provider that never has anything.
///
/// Useful as a terminal fallback and in tests.
pub struct EmptyProvider<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R> EmptyProvider<R> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R> Default for EmptyProvider<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TileRecord> TileProvider<R> for EmptyProvider<R> {
    fn get<'a>(
        &'a self,
        _tile: TileIndex,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<R>, TerraError>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(TerraError::Cancelled);
            }
            Ok(None)
        })
    }

    fn name(&self) -> &str {
        "empty"
    }
}
