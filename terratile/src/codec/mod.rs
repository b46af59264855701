//! Image codec boundary.
//!
//! Tile payloads arrive as encoded bytes (PNG heightmaps, JPEG imagery).
//! Consumers only see the [`ImageCodec`] trait; [`ImageCrateCodec`] is the
//! default implementation backed by the `image` crate.

mod image_crate;

pub use image_crate::ImageCrateCodec;

use thiserror::Error;

/// Output container for [`ImageCodec::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// Decoded pixel storage, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    Gray8(Vec<u8>),
    Gray16(Vec<u16>),
    Rgba8(Vec<u8>),
}

impl PixelData {
    /// Bits per channel.
    pub fn bit_depth(&self) -> u8 {
        match self {
            PixelData::Gray8(_) | PixelData::Rgba8(_) => 8,
            PixelData::Gray16(_) => 16,
        }
    }

    /// Number of channels per pixel.
    pub fn channels(&self) -> usize {
        match self {
            PixelData::Gray8(_) | PixelData::Gray16(_) => 1,
            PixelData::Rgba8(_) => 4,
        }
    }

    fn len(&self) -> usize {
        match self {
            PixelData::Gray8(v) | PixelData::Rgba8(v) => v.len(),
            PixelData::Gray16(v) => v.len(),
        }
    }
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: PixelData,
}

impl DecodedImage {
    /// Creates an image, checking the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: PixelData) -> Result<Self, CodecError> {
        let expected = width as usize * height as usize * pixels.channels();
        if pixels.len() != expected {
            return Err(CodecError::InvalidDimensions {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Errors from decoding or encoding image payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Encode failed: {0}")]
    Encode(String),

    #[error("Pixel buffer of {len} values does not match {width}x{height}")]
    InvalidDimensions { width: u32, height: u32, len: usize },
}

/// Decodes and encodes tile images.
pub trait ImageCodec: Send + Sync {
    /// Decodes an encoded image.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encodes pixels into the given container format.
    fn encode(&self, image: &DecodedImage, format: ImageFormat) -> Result<Vec<u8>, CodecError>;
}
