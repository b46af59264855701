//! Worker-scoped scratch buffer pool.
//!
//! Decoding a heightmap needs a tile-sized scratch raster. Instead of one
//! buffer per thread, a fixed number of buffers is handed out through a
//! semaphore: at most `capacity` decodes run at once, and each holds its
//! buffer exclusively until the guard drops.

use super::Raster;
use crate::error::TerraError;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Edge length of pooled scratch rasters, matching the tile size.
pub const SCRATCH_EDGE: usize = 256;

struct PoolInner {
    semaphore: Arc<Semaphore>,
    free: Mutex<Vec<Raster<u16>>>,
    capacity: usize,
    edge: usize,
}

/// A bounded pool of reusable `Raster<u16>` scratch buffers.
///
/// Cloning the pool shares the same buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Creates a pool of `capacity` tile-sized buffers.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_edge(capacity, SCRATCH_EDGE)
    }

    /// Creates a pool whose buffers start at `edge × edge` cells.
    pub fn with_edge(capacity: usize, edge: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(capacity)),
                free: Mutex::new(Vec::with_capacity(capacity)),
                capacity,
                edge,
            }),
        }
    }

    /// Waits for a free buffer.
    ///
    /// Returns [`TerraError::Cancelled`] if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<PooledBuffer, TerraError> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TerraError::Cancelled),
            permit = self.inner.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| TerraError::Cancelled)?
            }
        };

        let buffer = self
            .inner
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Raster::filled(self.inner.edge, self.inner.edge, 0));

        Ok(PooledBuffer {
            buffer,
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Total number of buffers.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Buffers not currently checked out.
    pub fn available(&self) -> usize {
        self.inner.semaphore.available_permits()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.inner.capacity)
            .field("available", &self.available())
            .field("edge", &self.inner.edge)
            .finish()
    }
}

/// Exclusive handle to a pooled buffer; returns it to the pool on drop.
pub struct PooledBuffer {
    buffer: Raster<u16>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("width", &self.buffer.width())
            .field("height", &self.buffer.height())
            .finish()
    }
}

impl Deref for PooledBuffer {
    type Target = Raster<u16>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl AsRef<Raster<u16>> for PooledBuffer {
    fn as_ref(&self) -> &Raster<u16> {
        &self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // Buffer goes back before the permit is released
        let buffer = std::mem::replace(&mut self.buffer, Raster::empty());
        self.pool.free.lock().push(buffer);
    }
}
