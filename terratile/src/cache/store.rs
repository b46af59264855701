//! Append-only persistent tile store.
//!
//! Each table is a directory; each row is one file named after the tile's
//! quadkey:
//! ```text
//! <root>/<table>/<level>/<quadkey>.tile
//! ```
//!
//! Rows are never updated or removed. Writes are insert-if-absent: the row
//! is written to a uniquely named temp file and hard-linked into place.
//! Linking fails with `AlreadyExists` if another writer got there first,
//! which is treated as success. A row is therefore either fully present or
//! absent; a crashed or cancelled writer leaves at most a stray temp file,
//! which readers never look at.

use super::access::StoreAccess;
use super::path::{row_path, table_directory};
use super::records::TileRecord;
use super::types::{InsertOutcome, TileTable};
use crate::coord::TileIndex;
use crate::error::TerraError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Persistent key/value store with one directory per table.
#[derive(Debug)]
pub struct TileStore {
    root: PathBuf,
    read_only: bool,
    access: StoreAccess,
    temp_counter: AtomicU64,
}

impl TileStore {
    /// Opens a store for reading and writing.
    ///
    /// Creates the root and table directories, then writes and removes a
    /// probe file so an unwritable location fails here rather than on the
    /// first write-back.
    ///
    /// # Errors
    ///
    /// Returns [`TerraError::Configuration`] if the root cannot be created
    /// or written.
    pub fn open(root: impl Into<PathBuf>, max_concurrent_io: usize) -> Result<Self, TerraError> {
        let root = root.into();
        Self::probe(&root).map_err(|e| {
            TerraError::Configuration(format!(
                "tile store at {} is not writable: {}",
                root.display(),
                e
            ))
        })?;

        info!(root = %root.display(), max_concurrent_io, "Opened tile store");
        Ok(Self {
            root,
            read_only: false,
            access: StoreAccess::new(max_concurrent_io),
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Opens a store that serves existing rows and never writes.
    ///
    /// The root need not exist; every lookup then misses.
    pub fn open_read_only(root: impl Into<PathBuf>, max_concurrent_io: usize) -> Self {
        let root = root.into();
        info!(root = %root.display(), "Opened tile store read-only");
        Self {
            root,
            read_only: true,
            access: StoreAccess::new(max_concurrent_io),
            temp_counter: AtomicU64::new(0),
        }
    }

    fn probe(root: &Path) -> std::io::Result<()> {
        for table in TileTable::ALL {
            std::fs::create_dir_all(table_directory(root, table))?;
        }
        let probe = root.join(format!(".probe-{}", std::process::id()));
        std::fs::write(&probe, b"probe")?;
        std::fs::remove_file(&probe)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The I/O gate shared by all operations on this store.
    pub fn access(&self) -> &StoreAccess {
        &self.access
    }

    /// Path of a row, whether or not it exists.
    pub fn row_path(&self, table: TileTable, tile: &TileIndex) -> PathBuf {
        row_path(&self.root, table, tile)
    }

    /// Reads a row's raw bytes, or `None` if absent.
    pub async fn read(
        &self,
        table: TileTable,
        tile: &TileIndex,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<u8>>, TerraError> {
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }
        let _permit = self.access.acquire(cancel).await?;

        let path = self.row_path(table, tile);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                trace!(table = %table, tile = %tile, bytes = bytes.len(), "Store row read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TerraError::Io(e)),
        }
    }

    /// Returns true if the row exists.
    pub async fn contains(&self, table: TileTable, tile: &TileIndex) -> bool {
        tokio::fs::try_exists(self.row_path(table, tile))
            .await
            .unwrap_or(false)
    }

    /// Inserts a row unless it already exists.
    ///
    /// Concurrent writers of the same key never error: exactly one observes
    /// [`InsertOutcome::Inserted`], the rest [`InsertOutcome::AlreadyPresent`].
    ///
    /// # Errors
    ///
    /// [`TerraError::Configuration`] on a read-only store,
    /// [`TerraError::Cancelled`] if cancelled before the row is committed,
    /// and [`TerraError::Io`] for filesystem failures.
    pub async fn insert(
        &self,
        table: TileTable,
        tile: &TileIndex,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<InsertOutcome, TerraError> {
        if self.read_only {
            return Err(TerraError::Configuration(format!(
                "tile store at {} is read-only",
                self.root.display()
            )));
        }
        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }
        let _permit = self.access.acquire(cancel).await?;

        let path = self.row_path(table, tile);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path(&path);
        let result = self.commit(&temp, &path, bytes, cancel).await;
        // The temp name is unique to this call, so removing it is always safe
        let _ = tokio::fs::remove_file(&temp).await;

        if let Ok(outcome) = &result {
            debug!(table = %table, tile = %tile, outcome = ?outcome, "Store insert");
        }
        result
    }

    async fn commit(
        &self,
        temp: &Path,
        path: &Path,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<InsertOutcome, TerraError> {
        let mut file = tokio::fs::File::create(temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        if cancel.is_cancelled() {
            return Err(TerraError::Cancelled);
        }

        match tokio::fs::hard_link(temp, path).await {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(InsertOutcome::AlreadyPresent),
            Err(e) => Err(TerraError::Io(e)),
        }
    }

    fn temp_path(&self, path: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
    }

    /// Reads and decodes a record; undecodable rows are [`TerraError::Corrupt`].
    pub async fn read_record<R: TileRecord>(
        &self,
        tile: &TileIndex,
        cancel: &CancellationToken,
    ) -> Result<Option<R>, TerraError> {
        match self.read(R::TABLE, tile, cancel).await? {
            Some(bytes) => R::decode(bytes)
                .map(Some)
                .map_err(|e| TerraError::corrupt(tile.to_quadkey(), e.to_string())),
            None => Ok(None),
        }
    }

    /// Encodes and inserts a record.
    pub async fn insert_record<R: TileRecord>(
        &self,
        tile: &TileIndex,
        record: &R,
        cancel: &CancellationToken,
    ) -> Result<InsertOutcome, TerraError> {
        self.insert(R::TABLE, tile, &record.encode(), cancel).await
    }
}
