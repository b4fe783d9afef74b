//! JPEG encoding for export.
//!
//! JPEG has no alpha channel, so alpha is dropped and the stored RGB is
//! written as is.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::buffer::PixelBuffer;
use crate::format::ImageFormat;

/// Encode a buffer to JPEG bytes.
///
/// `quality` is clamped to 1-100, where 100 is highest quality.
pub fn encode_jpeg(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgba = buffer
        .to_rgba_image()
        .ok_or_else(|| EncodeError::failed(ImageFormat::Jpeg, "pixel buffer size mismatch"))?;
    let rgb = DynamicImage::ImageRgba8(rgba).into_rgb8();

    let quality = quality.clamp(1, 100);
    let mut output = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);

    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::failed(ImageFormat::Jpeg, e))?;

    Ok(output.into_inner())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
