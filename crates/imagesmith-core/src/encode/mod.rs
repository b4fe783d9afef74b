//! Image encoding.
//!
//! Every format takes a quality on the 0-100 scale used across the crate and
//! maps it onto whatever its codec understands:
//!
//! | Format | Codec parameter | Mapping |
//! |--------|-----------------|---------|
//! | JPEG | quality 1-100 | clamped |
//! | PNG | compression level 0-9 | `clamp(10 - round(q / 10), 0, 9)` |
//! | GIF | quantizer speed 1-30 | `clamp(30 - round(q * 29 / 100), 1, 30)` |

mod gif;
mod jpeg;
mod png;

use thiserror::Error;

use crate::buffer::PixelBuffer;
use crate::format::ImageFormat;

pub use self::gif::{encode_gif, gif_speed};
pub use self::jpeg::encode_jpeg;
pub use self::png::{encode_png, png_compression_level};

/// Quality used when the caller does not pick one.
pub const DEFAULT_QUALITY: u8 = 50;

/// Highest meaningful quality; larger values are clamped.
pub const MAX_QUALITY: u8 = 100;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The codec rejected the image.
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: ImageFormat,
        message: String,
    },
}

impl EncodeError {
    fn failed(format: ImageFormat, err: impl std::fmt::Display) -> Self {
        EncodeError::EncodingFailed {
            format,
            message: err.to_string(),
        }
    }
}

/// Encode `buffer` as `format` at `quality` (0-100).
pub fn encode(buffer: &PixelBuffer, format: ImageFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let quality = quality.min(MAX_QUALITY);
    let bytes = match format {
        ImageFormat::Jpeg => encode_jpeg(buffer, quality)?,
        ImageFormat::Png => encode_png(buffer, quality)?,
        ImageFormat::Gif => encode_gif(buffer, quality)?,
    };
    tracing::debug!(%format, quality, size = bytes.len(), "encoded image");
    Ok(bytes)
}
