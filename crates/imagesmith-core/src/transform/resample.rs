//! Full-rectangle resampling shared by `scale` and `resize`.
//!
//! Delegates to the `image` crate's separable filters. All functions return
//! new buffers without modifying the input.

use serde::{Deserialize, Serialize};

use super::{check_pixel_count, TransformError};
use crate::buffer::PixelBuffer;

/// Filter type for resampling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Triangle filter; averages the covered source area when shrinking.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(FilterType::Nearest),
            "bilinear" | "triangle" => Ok(FilterType::Bilinear),
            "lanczos3" | "lanczos" => Ok(FilterType::Lanczos3),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// Resample the whole of `buffer` into a `width` x `height` buffer.
///
/// # Errors
///
/// Returns `TransformError::InvalidDimensions` for a zero target size and
/// `TransformError::Failed` if the source cannot be handed to the resampler.
pub fn resample(
    buffer: &PixelBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDimensions(format!(
            "cannot resample to {width}x{height}"
        )));
    }

    check_pixel_count(width, height)?;

    // Fast path: if dimensions match, just clone
    if buffer.dimensions() == (width, height) {
        return Ok(buffer.clone());
    }

    let rgba = buffer
        .to_rgba_image()
        .ok_or_else(|| TransformError::Failed("failed to create RgbaImage".to_string()))?;

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());

    tracing::debug!(
        from_width = buffer.width(),
        from_height = buffer.height(),
        width,
        height,
        ?filter,
        "resampled"
    );

    PixelBuffer::from_rgba_image(resized).map_err(|e| TransformError::Failed(e.to_string()))
}
