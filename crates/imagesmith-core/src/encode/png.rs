//! PNG encoding with a quality-derived compression level.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::buffer::PixelBuffer;
use crate::format::ImageFormat;

/// Map a 0-100 quality onto a 0-9 compression level.
///
/// Higher quality means less compression: 100 → 0, 0 → 9.
pub fn png_compression_level(quality: u8) -> u8 {
    let level = 10 - (quality as f32 / 10.0).round() as i32;
    level.clamp(0, 9) as u8
}

fn compression_type(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode a buffer to PNG bytes, keeping alpha. No row filtering is applied.
pub fn encode_png(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let compression = compression_type(png_compression_level(quality));
    let mut output = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut output, compression, FilterType::NoFilter);

    encoder
        .write_image(
            buffer.as_bytes(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::failed(ImageFormat::Png, e))?;

    Ok(output)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
