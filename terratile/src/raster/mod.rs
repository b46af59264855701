//! Raster grids and the shared bilinear sampling rule.
//!
//! Heightmaps, imagery and attribute masks are all sampled through
//! [`sample_bilinear`], so the edge policy is identical everywhere.

mod pool;

pub use pool::{BufferPool, PooledBuffer, SCRATCH_EDGE};

/// A row-major 2D grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Raster<T> {
    /// A zero-sized raster that owns no allocation.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl<T> AsRef<Raster<T>> for Raster<T> {
    fn as_ref(&self) -> &Raster<T> {
        self
    }
}

impl<T: Copy> Raster<T> {
    /// Creates a raster filled with `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wraps existing row-major data.
    ///
    /// Returns `None` when `data.len()` is not `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true if the raster holds no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    /// Overwrites the value at column `x`, row `y`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Replaces the contents, reusing the allocation where possible.
    ///
    /// Used by pooled scratch buffers so repeated decodes do not reallocate.
    pub fn refill_from(&mut self, width: usize, height: usize, values: impl IntoIterator<Item = T>) {
        self.data.clear();
        self.data.extend(values.into_iter().take(width * height));
        self.width = width;
        self.height = if width == 0 { 0 } else { self.data.len() / width };
    }
}

/// Clamped cell index and blend fraction along one axis.
///
/// The last cell steps back one with a fraction of 1.0, so `index + 1`
/// always stays inside the axis.
fn axis_index(coordinate: f64, size: usize) -> (usize, usize, f64) {
    if size <= 1 {
        return (0, 0, 0.0);
    }
    let last = (size - 1) as f64;
    let c = if coordinate.is_nan() {
        0.0
    } else {
        coordinate.clamp(0.0, last)
    };

    let index = c.trunc() as usize;
    if index >= size - 1 {
        (size - 2, size - 1, 1.0)
    } else {
        (index, index + 1, c - index as f64)
    }
}

#[inline]
fn blend(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Bilinearly samples a raster at fractional column `x`, row `y`.
///
/// Coordinates are clamped to the grid. Exact integer coordinates return
/// the stored cell value unchanged.
pub fn sample_bilinear<T>(raster: &Raster<T>, x: f64, y: f64) -> f64
where
    T: Copy + Into<f64>,
{
    sample_with(raster, x, y, |v| v.into())
}

/// Bilinear sample of one channel extracted by `channel`.
fn sample_with<T: Copy>(raster: &Raster<T>, x: f64, y: f64, channel: impl Fn(T) -> f64) -> f64 {
    if raster.is_empty() {
        return 0.0;
    }
    let (c0, c1, fx) = axis_index(x, raster.width);
    let (r0, r1, fy) = axis_index(y, raster.height);

    let top = blend(
        channel(raster.get(c0, r0)),
        channel(raster.get(c1, r0)),
        fx,
    );
    let bottom = blend(
        channel(raster.get(c0, r1)),
        channel(raster.get(c1, r1)),
        fx,
    );
    blend(top, bottom, fy)
}

/// Bilinearly samples an RGBA raster, channel by channel.
pub fn sample_rgba(raster: &Raster<[u8; 4]>, x: f64, y: f64) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let value = sample_with(raster, x, y, |px| px[i] as f64);
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}
