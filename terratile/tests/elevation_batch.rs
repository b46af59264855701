//! End-to-end elevation batch over a real tile store.

use std::sync::Arc;
use terratile::cache::{HeightmapRecord, TileCache, TileProvider, TileStore};
use terratile::codec::{DecodedImage, ImageCodec, ImageCrateCodec, ImageFormat, PixelData};
use terratile::coord::{pixel_to_geo, tile_pixel_origin, PixelPosition, TileIndex};
use terratile::elevation::{group_by_tile, ElevationQuery, ElevationSample, GroupingStrategy};
use terratile::raster::BufferPool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const LEVEL: u8 = 10;

fn point_in(tile: &TileIndex, dx: f64, dy: f64) -> ElevationSample {
    let origin = tile_pixel_origin(tile);
    ElevationSample::new(pixel_to_geo(
        &PixelPosition::new(origin.x + dx, origin.y + dy),
        tile.level(),
    ))
}

/// West-to-east ramp from 0 m to 1000 m.
fn ramp_heightmap(codec: &ImageCrateCodec) -> HeightmapRecord {
    let image = DecodedImage::new(2, 2, PixelData::Gray16(vec![0, 1000, 0, 1000])).unwrap();
    HeightmapRecord {
        base_elevation: 0.0,
        elevation_delta: 65535.0,
        height_map: codec.encode(&image, ImageFormat::Png).unwrap(),
    }
}

#[tokio::test]
async fn missing_tile_defaults_while_present_tile_interpolates() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TileStore::open(dir.path(), 4).unwrap());
    let codec = ImageCrateCodec::new();
    let cancel = CancellationToken::new();

    let tile_a = TileIndex::new(LEVEL, 380, 520).unwrap();
    let tile_b = TileIndex::new(LEVEL, 381, 523).unwrap();

    let heightmaps = Arc::new(TileCache::<HeightmapRecord>::new(store.clone()));
    heightmaps
        .insert(&tile_b, &ramp_heightmap(&codec), &cancel)
        .await
        .unwrap();

    let mut samples = vec![
        point_in(&tile_a, 10.0, 10.0),
        point_in(&tile_a, 100.0, 40.0),
        point_in(&tile_b, 192.0, 50.0),
        point_in(&tile_a, 200.0, 200.0),
        point_in(&tile_a, 250.0, 5.0),
    ];
    for sample in samples.iter_mut() {
        sample.elevation = -1.0;
    }

    let groups = group_by_tile(&samples, LEVEL);
    let mut sizes: Vec<usize> = groups.iter().map(|g| g.indices.len()).collect();
    sizes.sort();
    assert_eq!(sizes, vec![1, 4]);

    let provider: Arc<dyn TileProvider<HeightmapRecord>> = heightmaps.clone();
    let query = ElevationQuery::new(provider, Arc::new(codec), BufferPool::new(2));
    let report = query
        .query(&mut samples, LEVEL, GroupingStrategy::PerTile, &cancel)
        .await
        .unwrap();

    assert_eq!(report.groups, 2);
    assert_eq!(report.tiles_hit, 1);
    assert_eq!(report.defaulted_points, 4);

    for index in [0, 1, 3, 4] {
        assert_eq!(samples[index].elevation, 0.0, "sample {}", index);
    }
    assert!(
        (samples[2].elevation - 750.0).abs() < 0.01,
        "interpolated {}",
        samples[2].elevation
    );

    let stats = heightmaps.statistics();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn cancelled_batch_leaves_store_readable() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TileStore::open(dir.path(), 1).unwrap());
    let codec = ImageCrateCodec::new();
    let cancel = CancellationToken::new();

    let tile = TileIndex::new(LEVEL, 100, 100).unwrap();
    let heightmaps = Arc::new(TileCache::<HeightmapRecord>::new(store.clone()));
    heightmaps
        .insert(&tile, &ramp_heightmap(&codec), &cancel)
        .await
        .unwrap();

    let provider: Arc<dyn TileProvider<HeightmapRecord>> = heightmaps.clone();
    let query = ElevationQuery::new(provider, Arc::new(codec), BufferPool::new(1));
    let mut samples = vec![point_in(&tile, 128.0, 128.0)];

    cancel.cancel();
    assert!(query
        .query(&mut samples, LEVEL, GroupingStrategy::PerTile, &cancel)
        .await
        .is_err());

    let fresh = CancellationToken::new();
    let report = query
        .query(&mut samples, LEVEL, GroupingStrategy::PerTile, &fresh)
        .await
        .unwrap();
    assert_eq!(report.tiles_hit, 1);
    assert!((samples[0].elevation - 500.0).abs() < 0.01);
}
