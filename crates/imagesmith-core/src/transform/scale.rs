//! Uniform scaling by a factor or percentage.

use std::str::FromStr;

use super::{output_dimensions, resample, FilterType, TransformError};
use crate::buffer::PixelBuffer;

/// A validated, positive scale multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Create a factor from a raw multiplier.
    pub fn new(factor: f64) -> Result<Self, TransformError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(TransformError::InvalidDimensions(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        Ok(Self(factor))
    }

    /// Create a factor from a percentage (`50.0` → `0.5`).
    pub fn percent(percent: f64) -> Result<Self, TransformError> {
        Self::new(percent / 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Dimensions after scaling, always rounded up.
    ///
    /// # Errors
    ///
    /// `InvalidDimensions` when the result exceeds
    /// [`MAX_PIXELS`](super::MAX_PIXELS).
    pub fn apply(self, width: u32, height: u32) -> Result<(u32, u32), TransformError> {
        output_dimensions(width as f64 * self.0, height as f64 * self.0)
    }
}

impl FromStr for ScaleFactor {
    type Err = TransformError;

    /// Parse `"50%"` as a percentage or `"1.5"` as a raw multiplier.
    ///
    /// For percentages every character other than digits and `.` is dropped
    /// before parsing, so `"50 %"` and `"%50"` both mean one half.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TransformError::InvalidDimensions(format!("invalid scale: {s:?}"));

        if s.contains('%') {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let percent: f64 = digits.parse().map_err(|_| invalid())?;
            Self::percent(percent)
        } else {
            let factor: f64 = s.trim().parse().map_err(|_| invalid())?;
            Self::new(factor)
        }
    }
}

/// Scale `buffer` by `factor`, resampling the full source into the full
/// destination. New dimensions are `ceil(width * factor)` x `ceil(height * factor)`.
pub fn scale(
    buffer: &PixelBuffer,
    factor: ScaleFactor,
    filter: FilterType,
) -> Result<PixelBuffer, TransformError> {
    let (width, height) = factor.apply(buffer.width(), buffer.height())?;
    resample(buffer, width, height, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::{gradient, numbered};

    #[test]
    fn test_parse_percent() {
        let factor: ScaleFactor = "50%".parse().unwrap();
        assert!((factor.value() - 0.5).abs() < f64::EPSILON);

        let factor: ScaleFactor = "12.5 %".parse().unwrap();
        assert!((factor.value() - 0.125).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_multiplier() {
        let factor: ScaleFactor = "1.5".parse().unwrap();
        assert!((factor.value() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("abc".parse::<ScaleFactor>().is_err());
        assert!("0".parse::<ScaleFactor>().is_err());
        assert!("0%".parse::<ScaleFactor>().is_err());
        assert!("-2".parse::<ScaleFactor>().is_err());
        assert!("%".parse::<ScaleFactor>().is_err());
        assert!(ScaleFactor::new(f64::NAN).is_err());
        assert!(ScaleFactor::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_dimensions_round_up() {
        let factor = ScaleFactor::new(0.5).unwrap();
        assert_eq!(factor.apply(101, 33).unwrap(), (51, 17));

        let factor = ScaleFactor::new(0.001).unwrap();
        assert_eq!(factor.apply(10, 10).unwrap(), (1, 1));
    }

    #[test]
    fn test_huge_factor_is_rejected_before_resampling() {
        let img = gradient(10, 10);
        let factor: ScaleFactor = "1e9".parse().unwrap();
        assert!(matches!(
            scale(&img, factor, FilterType::Bilinear),
            Err(TransformError::InvalidDimensions(_))
        ));

        // 10x10 at 1001x is 10010 per side, just over the pixel limit
        let factor = ScaleFactor::new(1001.0).unwrap();
        assert!(factor.apply(10, 10).is_err());
        let factor = ScaleFactor::new(1000.0).unwrap();
        assert_eq!(factor.apply(10, 10).unwrap(), (10_000, 10_000));
    }

    #[test]
    fn test_scale_half() {
        let img = gradient(100, 60);
        let scaled = scale(&img, "50%".parse().unwrap(), FilterType::Bilinear).unwrap();
        assert_eq!(scaled.dimensions(), (50, 30));
    }

    #[test]
    fn test_scale_up() {
        let img = gradient(10, 7);
        let scaled = scale(&img, ScaleFactor::new(2.5).unwrap(), FilterType::Lanczos3).unwrap();
        assert_eq!(scaled.dimensions(), (25, 18));
    }

    #[test]
    fn test_scale_one_is_identity() {
        let img = numbered(37, 23);
        let scaled = scale(&img, ScaleFactor::new(1.0).unwrap(), FilterType::Bilinear).unwrap();
        assert_eq!(scaled, img);
    }
}
