//! Decoded heightmap tiles.

use crate::cache::HeightmapRecord;
use crate::codec::{CodecError, DecodedImage, ImageCodec, PixelData};
use crate::coord::{TileIndex, TILE_SIZE};
use crate::error::TerraError;
use crate::raster::{sample_bilinear, PooledBuffer, Raster};
use std::sync::Arc;
use tracing::trace;

/// A heightmap raster with its elevation scale.
///
/// Cell value `v` is `v * elevation_delta / (2^bit_depth - 1) +
/// base_elevation` meters. The raster is any owner of a `Raster<u16>`,
/// typically a pooled scratch buffer.
#[derive(Debug)]
pub struct Heightmap<B = Raster<u16>> {
    raster: B,
    bit_depth: u8,
    base_elevation: f64,
    elevation_delta: f64,
}

impl<B: AsRef<Raster<u16>>> Heightmap<B> {
    /// Wraps a raster; `bit_depth` is clamped to 1..=16.
    pub fn new(raster: B, bit_depth: u8, base_elevation: f64, elevation_delta: f64) -> Self {
        Self {
            raster,
            bit_depth: bit_depth.clamp(1, 16),
            base_elevation,
            elevation_delta,
        }
    }

    pub fn raster(&self) -> &Raster<u16> {
        self.raster.as_ref()
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    pub fn elevation_delta(&self) -> f64 {
        self.elevation_delta
    }

    fn scale(&self) -> f64 {
        self.elevation_delta / ((1u32 << self.bit_depth) - 1) as f64
    }

    /// Elevation of a raw cell value.
    pub fn cell_elevation(&self, value: u16) -> f64 {
        value as f64 * self.scale() + self.base_elevation
    }

    /// Bilinear elevation at fractional raster column `x`, row `y`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        sample_bilinear(self.raster(), x, y) * self.scale() + self.base_elevation
    }

    /// Elevation at a pixel offset inside the tile, `[0, TILE_SIZE]` on
    /// each axis.
    ///
    /// The raster is grid-registered: its first and last cells sit on the
    /// tile's edges, and offset `p` maps to cell `p / TILE_SIZE * (n - 1)`.
    /// Integer pixel offsets are therefore not cell indices. On a 256-cell
    /// raster, pixel 255 samples cell 254.004 and only offset 256 reaches
    /// the last cell.
    pub fn sample_tile_pixel(&self, x: f64, y: f64) -> f64 {
        let raster = self.raster();
        let to_grid = |offset: f64, cells: usize| {
            offset / TILE_SIZE as f64 * cells.saturating_sub(1) as f64
        };
        self.sample(to_grid(x, raster.width()), to_grid(y, raster.height()))
    }
}

/// Copies decoded pixels into `raster`, returning the bit depth.
///
/// 8-bit gray is promoted to u16 with its depth kept at 8. RGBA images use
/// the red channel.
fn fill_raster(raster: &mut Raster<u16>, image: DecodedImage) -> Result<u8, CodecError> {
    let (width, height) = (image.width as usize, image.height as usize);
    if width == 0 || height == 0 {
        return Err(CodecError::Decode("empty heightmap image".to_string()));
    }

    let bit_depth = image.pixels.bit_depth();
    match image.pixels {
        PixelData::Gray8(values) => {
            raster.refill_from(width, height, values.into_iter().map(u16::from))
        }
        PixelData::Gray16(values) => raster.refill_from(width, height, values),
        PixelData::Rgba8(values) => raster.refill_from(
            width,
            height,
            values.chunks_exact(4).map(|px| u16::from(px[0])),
        ),
    }
    Ok(bit_depth)
}

/// Decodes a heightmap record into a pooled buffer.
///
/// Image decoding runs on the blocking pool. Any decode failure is
/// [`TerraError::Corrupt`] for `tile`.
pub async fn decode_heightmap(
    record: HeightmapRecord,
    tile: TileIndex,
    codec: Arc<dyn ImageCodec>,
    mut buffer: PooledBuffer,
) -> Result<Heightmap<PooledBuffer>, TerraError> {
    let HeightmapRecord {
        base_elevation,
        elevation_delta,
        height_map,
    } = record;

    let decoded = tokio::task::spawn_blocking(move || {
        let image = codec.decode(&height_map)?;
        let bit_depth = fill_raster(&mut buffer, image)?;
        Ok::<_, CodecError>((buffer, bit_depth))
    })
    .await;

    match decoded {
        Ok(Ok((buffer, bit_depth))) => {
            trace!(
                tile = %tile,
                width = buffer.width(),
                height = buffer.height(),
                bit_depth,
                "Heightmap decoded"
            );
            Ok(Heightmap::new(buffer, bit_depth, base_elevation, elevation_delta))
        }
        Ok(Err(e)) => Err(TerraError::corrupt(tile.to_quadkey(), e.to_string())),
        Err(e) => Err(TerraError::corrupt(
            tile.to_quadkey(),
            format!("decode task failed: {}", e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ImageCrateCodec, ImageFormat};
    use crate::raster::BufferPool;
    use tokio_util::sync::CancellationToken;

    fn png(width: u32, height: u32, pixels: PixelData) -> Vec<u8> {
        let image = DecodedImage::new(width, height, pixels).unwrap();
        ImageCrateCodec::new().encode(&image, ImageFormat::Png).unwrap()
    }

    #[test]
    fn test_cell_elevation_scaling() {
        let raster = Raster::filled(2, 2, 0u16);
        let heightmap = Heightmap::new(raster, 16, -100.0, 65535.0);
        assert_eq!(heightmap.cell_elevation(0), -100.0);
        assert_eq!(heightmap.cell_elevation(65535), 65435.0);

        let eight = Heightmap::new(Raster::filled(2, 2, 0u16), 8, 0.0, 255.0);
        assert_eq!(eight.cell_elevation(255), 255.0);
    }

    #[test]
    fn test_sample_at_grid_point_is_cell_value() {
        let raster = Raster::from_vec(2, 2, vec![0u16, 100, 200, 300]).unwrap();
        let heightmap = Heightmap::new(raster, 16, 0.0, 65535.0);
        assert_eq!(heightmap.sample(1.0, 1.0), 300.0);
        assert_eq!(heightmap.sample(0.5, 0.0), 50.0);
    }

    #[test]
    fn test_sample_tile_pixel_maps_span_to_grid() {
        let raster = Raster::from_vec(2, 2, vec![0u16, 1000, 0, 1000]).unwrap();
        let heightmap = Heightmap::new(raster, 16, 0.0, 65535.0);

        assert_eq!(heightmap.sample_tile_pixel(0.0, 0.0), 0.0);
        assert!((heightmap.sample_tile_pixel(128.0, 10.0) - 500.0).abs() < 1e-9);
        assert!(heightmap.sample_tile_pixel(255.9, 0.0) < 1000.0);
    }

    #[test]
    fn test_sample_tile_pixel_is_grid_registered() {
        let edge = TILE_SIZE as usize;
        let ramp: Vec<u16> = (0..edge * edge).map(|i| (i % edge) as u16).collect();
        let heightmap = Heightmap::new(Raster::from_vec(edge, edge, ramp).unwrap(), 16, 0.0, 65535.0);

        // Column value equals the column index, so the sample is the grid x
        let expected = 255.0 / 256.0 * 255.0;
        assert!((heightmap.sample_tile_pixel(255.0, 0.0) - expected).abs() < 1e-9);
        assert!((heightmap.sample_tile_pixel(255.0, 0.0) - 254.004).abs() < 1e-3);
        assert_eq!(heightmap.sample_tile_pixel(0.0, 0.0), 0.0);
        assert_eq!(heightmap.sample_tile_pixel(256.0, 0.0), 255.0);
    }

    #[tokio::test]
    async fn test_decode_gray16_heightmap() {
        let record = HeightmapRecord {
            base_elevation: 10.0,
            elevation_delta: 65535.0,
            height_map: png(2, 2, PixelData::Gray16(vec![0, 1, 2, 3])),
        };
        let pool = BufferPool::new(1);
        let cancel = CancellationToken::new();
        let buffer = pool.acquire(&cancel).await.unwrap();

        let heightmap = decode_heightmap(
            record,
            TileIndex::root(),
            Arc::new(ImageCrateCodec::new()),
            buffer,
        )
        .await
        .unwrap();

        assert_eq!(heightmap.bit_depth(), 16);
        assert_eq!(heightmap.raster().width(), 2);
        assert_eq!(heightmap.sample(1.0, 1.0), 13.0);
        assert_eq!(pool.available(), 0);

        drop(heightmap);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_decode_gray8_keeps_depth() {
        let record = HeightmapRecord {
            base_elevation: 0.0,
            elevation_delta: 255.0,
            height_map: png(1, 2, PixelData::Gray8(vec![7, 200])),
        };
        let pool = BufferPool::new(1);
        let buffer = pool.acquire(&CancellationToken::new()).await.unwrap();

        let heightmap = decode_heightmap(
            record,
            TileIndex::root(),
            Arc::new(ImageCrateCodec::new()),
            buffer,
        )
        .await
        .unwrap();

        assert_eq!(heightmap.bit_depth(), 8);
        assert_eq!(heightmap.sample(0.0, 1.0), 200.0);
    }

    #[tokio::test]
    async fn test_decode_garbage_is_corrupt() {
        let record = HeightmapRecord {
            base_elevation: 0.0,
            elevation_delta: 1.0,
            height_map: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let pool = BufferPool::new(1);
        let buffer = pool.acquire(&CancellationToken::new()).await.unwrap();
        let tile = TileIndex::new(2, 1, 1).unwrap();

        let err = decode_heightmap(record, tile, Arc::new(ImageCrateCodec::new()), buffer)
            .await
            .unwrap_err();
        assert!(matches!(err, TerraError::Corrupt { ref tile, .. } if tile == "03"));
        // The buffer went back to the pool with the failed task
        assert_eq!(pool.available(), 1);
    }
}
