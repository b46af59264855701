//! [`ImageCodec`] backed by the `image` crate.

use super::{CodecError, DecodedImage, ImageCodec, ImageFormat, PixelData};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbaImage};
use std::io::Cursor;

/// PNG and JPEG codec using the `image` crate.
///
/// Grayscale inputs keep their bit depth; everything else decodes to RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self
    }

    fn to_dynamic(image: &DecodedImage) -> Result<DynamicImage, CodecError> {
        let DecodedImage {
            width,
            height,
            pixels,
        } = image;
        let mismatch = || CodecError::InvalidDimensions {
            width: *width,
            height: *height,
            len: pixels.len(),
        };

        let dynamic = match pixels {
            PixelData::Gray8(data) => DynamicImage::ImageLuma8(
                GrayImage::from_raw(*width, *height, data.clone()).ok_or_else(mismatch)?,
            ),
            PixelData::Gray16(data) => DynamicImage::ImageLuma16(
                ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(*width, *height, data.clone())
                    .ok_or_else(mismatch)?,
            ),
            PixelData::Rgba8(data) => DynamicImage::ImageRgba8(
                RgbaImage::from_raw(*width, *height, data.clone()).ok_or_else(mismatch)?,
            ),
        };
        Ok(dynamic)
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());

        let pixels = match decoded {
            DynamicImage::ImageLuma8(buf) => PixelData::Gray8(buf.into_raw()),
            DynamicImage::ImageLuma16(buf) => PixelData::Gray16(buf.into_raw()),
            other @ DynamicImage::ImageLumaA16(_) => {
                PixelData::Gray16(other.into_luma16().into_raw())
            }
            other => PixelData::Rgba8(other.into_rgba8().into_raw()),
        };

        DecodedImage::new(width, height, pixels)
    }

    fn encode(&self, image: &DecodedImage, format: ImageFormat) -> Result<Vec<u8>, CodecError> {
        let dynamic = Self::to_dynamic(image)?;

        let (dynamic, target) = match format {
            ImageFormat::Png => (dynamic, image::ImageFormat::Png),
            // JPEG carries neither alpha nor 16-bit samples
            ImageFormat::Jpeg => {
                let flattened = match dynamic {
                    DynamicImage::ImageLuma8(_) => dynamic,
                    DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(dynamic.to_luma8()),
                    _ => DynamicImage::ImageRgb8(dynamic.to_rgb8()),
                };
                (flattened, image::ImageFormat::Jpeg)
            }
        };

        let mut bytes = Vec::new();
        dynamic
            .write_to(&mut Cursor::new(&mut bytes), target)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}
