//! Concurrent writers racing for the same row.

use std::sync::Arc;
use terratile::cache::{
    level_directory, BoxFuture, CacheLookup, InsertOutcome, MeshRecord, ProviderChain, TileCache,
    TileRecord, TileStore,
};
use terratile::coord::TileIndex;
use terratile::provider::{ProviderError, TileSource};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// A source that always serves the same payload.
struct FixedSource(Vec<u8>);

impl TileSource for FixedSource {
    fn fetch_tile<'a>(
        &'a self,
        _tile: TileIndex,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<Vec<u8>>, ProviderError>> {
        Box::pin(async move { Ok(Some(self.0.clone())) })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_leave_exactly_one_row() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TileStore::open(dir.path(), 8).unwrap());
    let tile = TileIndex::from_quadkey("0231").unwrap();

    let handles: Vec<_> = (0..8u8)
        .map(|writer| {
            let store = store.clone();
            tokio::spawn(async move {
                let payload = vec![writer; 4096];
                let outcome = store
                    .insert(MeshRecord::TABLE, &tile, &payload, &CancellationToken::new())
                    .await;
                (payload, outcome)
            })
        })
        .collect();

    let mut inserted = Vec::new();
    for handle in handles {
        let (payload, outcome) = handle.await.unwrap();
        match outcome.expect("racing writer must not error") {
            InsertOutcome::Inserted => inserted.push(payload),
            InsertOutcome::AlreadyPresent => {}
        }
    }
    assert_eq!(inserted.len(), 1);

    let row = store
        .read(MeshRecord::TABLE, &tile, &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row, inserted[0]);

    let entries: Vec<_> = std::fs::read_dir(level_directory(store.root(), MeshRecord::TABLE, 4))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["0231.tile".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_caches_racing_write_back_both_succeed() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TileStore::open(dir.path(), 4).unwrap());
    let tile = TileIndex::new(12, 1500, 2100).unwrap();

    let cache = |payload: u8| {
        Arc::new(
            TileCache::<MeshRecord>::new(store.clone())
                .with_fallback(ProviderChain::network(Arc::new(FixedSource(vec![payload; 64])))),
        )
    };
    let first = cache(1);
    let second = cache(2);

    let (a, b) = tokio::join!(
        {
            let first = first.clone();
            tokio::spawn(async move { first.get(tile, &CancellationToken::new()).await })
        },
        {
            let second = second.clone();
            tokio::spawn(async move { second.get(tile, &CancellationToken::new()).await })
        }
    );

    for lookup in [a.unwrap().unwrap(), b.unwrap().unwrap()] {
        match lookup {
            CacheLookup::Found { write_error, .. } => assert!(write_error.is_none()),
            CacheLookup::NotFound => panic!("racing lookup lost its record"),
        }
    }

    let stored = store
        .read_record::<MeshRecord>(&tile, &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();
    assert!(stored == MeshRecord::new(vec![1; 64]) || stored == MeshRecord::new(vec![2; 64]));

    let (s1, s2) = (first.statistics(), second.statistics());
    assert!(s1.writes + s2.writes <= 1);
    assert_eq!(s1.writes + s2.writes + s1.write_conflicts + s2.write_conflicts + s1.hits + s2.hits, 2);
}
