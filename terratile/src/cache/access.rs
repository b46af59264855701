//! Semaphore gate for tile store I/O.
//!
//! The store is a directory tree and tolerates concurrent access, but disk
//! throughput does not scale with the number of in-flight operations. Every
//! read and write takes a permit first; a capacity of 1 serializes the
//! store behind a single-writer lock.

use crate::error::TerraError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Default number of concurrent store operations.
pub const DEFAULT_STORE_CONCURRENCY: usize = 16;

/// A semaphore-backed limiter for store operations.
#[derive(Debug)]
pub struct StoreAccess {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StoreAccess {
    /// Creates a gate admitting `capacity` operations; zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Acquires a permit, waiting if none available.
    ///
    /// Returns [`TerraError::Cancelled`] if `cancel` fires while waiting.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<StorePermit<'_>, TerraError> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TerraError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| TerraError::Cancelled)?
            }
        };

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        Ok(StorePermit {
            _permit: permit,
            in_flight: &self.in_flight,
        })
    }

    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of available permits.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Returns the current number of in-flight operations.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns the peak number of concurrent operations observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

impl Default for StoreAccess {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CONCURRENCY)
    }
}

/// A permit from [`StoreAccess`], released on drop.
pub struct StorePermit<'a> {
    _permit: OwnedSemaphorePermit,
    in_flight: &'a AtomicUsize,
}

impl Drop for StorePermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for StorePermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePermit").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_track_in_flight() {
        let access = StoreAccess::new(2);
        let cancel = CancellationToken::new();

        let a = access.acquire(&cancel).await.unwrap();
        let b = access.acquire(&cancel).await.unwrap();
        assert_eq!(access.in_flight(), 2);
        assert_eq!(access.available(), 0);

        drop(a);
        drop(b);
        assert_eq!(access.in_flight(), 0);
        assert_eq!(access.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_single_permit_serializes() {
        let access = StoreAccess::new(1);
        let cancel = CancellationToken::new();
        let _held = access.acquire(&cancel).await.unwrap();

        let waiter = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            access.acquire(&cancel),
        )
        .await;
        assert!(waiter.is_err(), "second permit should wait");
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let access = StoreAccess::new(1);
        let cancel = CancellationToken::new();
        let _held = access.acquire(&cancel).await.unwrap();

        cancel.cancel();
        assert!(matches!(
            access.acquire(&cancel).await,
            Err(TerraError::Cancelled)
        ));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(StoreAccess::new(0).capacity(), 1);
        assert_eq!(StoreAccess::default().capacity(), DEFAULT_STORE_CONCURRENCY);
    }
}
