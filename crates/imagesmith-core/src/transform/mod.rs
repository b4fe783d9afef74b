//! Geometric transforms: scale, resize, rotate and flip.
//!
//! Every transform reads an existing [`PixelBuffer`](crate::PixelBuffer) and
//! returns a newly allocated one; the input is never modified. On error no
//! buffer is produced, so callers keep whatever they held before.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, rows run top to bottom
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - All computed dimensions are rounded up before a buffer is allocated

use thiserror::Error;

use crate::color::ColorError;

mod flip;
mod resample;
mod resize;
mod rotation;
mod scale;

pub use flip::{flip, FlipAxis};
pub use resample::{resample, FilterType};
pub use resize::{plan_resize, resize, ResizePlan, ResizePolicy, ResizeSpec};
pub use rotation::{compute_rotated_bounds, rotate, InterpolationFilter};
pub use scale::{scale, ScaleFactor};

/// Errors raised by geometric transforms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Requested dimensions or factors are empty, zero or not finite.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Rotation background color could not be normalized.
    #[error("Invalid background color: {0}")]
    InvalidColor(#[from] ColorError),

    /// The resampling or rotation primitive failed.
    #[error("Transform failed: {0}")]
    Failed(String),
}

/// Largest output a transform will allocate: 100 megapixels, 400 MB of RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

/// Reject an output size of more than [`MAX_PIXELS`].
pub(crate) fn check_pixel_count(width: u32, height: u32) -> Result<(), TransformError> {
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(TransformError::InvalidDimensions(format!(
            "{width}x{height} is {pixels} pixels, limit is {MAX_PIXELS}"
        )));
    }
    Ok(())
}

/// Round computed dimensions up to whole pixels (at least 1) and check the
/// result can be allocated.
pub(crate) fn output_dimensions(width: f64, height: f64) -> Result<(u32, u32), TransformError> {
    let side = |value: f64| -> Result<u32, TransformError> {
        let rounded = value.ceil().max(1.0);
        if !rounded.is_finite() || rounded > u32::MAX as f64 {
            return Err(TransformError::InvalidDimensions(format!(
                "computed side {value} does not fit an image"
            )));
        }
        Ok(rounded as u32)
    };
    let (width, height) = (side(width)?, side(height)?);
    check_pixel_count(width, height)?;
    Ok((width, height))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dimensions_round_up() {
        assert_eq!(output_dimensions(10.2, 0.3).unwrap(), (11, 1));
        assert_eq!(output_dimensions(10_000.0, 10_000.0).unwrap(), (10_000, 10_000));
    }

    #[test]
    fn test_output_dimensions_reject_oversized() {
        assert!(matches!(
            output_dimensions(1e10, 10.0),
            Err(TransformError::InvalidDimensions(_))
        ));
        assert!(matches!(
            output_dimensions(f64::INFINITY, 10.0),
            Err(TransformError::InvalidDimensions(_))
        ));
        assert!(matches!(
            output_dimensions(10_001.0, 10_000.0),
            Err(TransformError::InvalidDimensions(_))
        ));
        assert!(check_pixel_count(u32::MAX, u32::MAX).is_err());
        assert!(check_pixel_count(100_000, 1_000).is_ok());
    }
}
