//! Mirroring along the vertical and horizontal axes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TransformError;
use crate::buffer::{PixelBuffer, CHANNELS};

/// Which way to flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    /// Reverse the row order (upside down).
    Vertical,
    /// Reverse the column order (mirror image).
    Horizontal,
    #[default]
    Both,
}

impl FromStr for FlipAxis {
    type Err = std::convert::Infallible;

    /// Only the first character counts: `v…` is vertical, `h…` horizontal,
    /// and anything else flips both ways.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('v') => FlipAxis::Vertical,
            Some('h') => FlipAxis::Horizontal,
            _ => FlipAxis::Both,
        })
    }
}

/// Flip `buffer` along `axis` into a new buffer of the same size.
///
/// `Both` succeeds only when both the vertical and the horizontal pass do.
pub fn flip(buffer: &PixelBuffer, axis: FlipAxis) -> Result<PixelBuffer, TransformError> {
    match axis {
        FlipAxis::Vertical => flip_vertical(buffer),
        FlipAxis::Horizontal => flip_horizontal(buffer),
        FlipAxis::Both => {
            let vertical = flip_vertical(buffer)?;
            flip_horizontal(&vertical)
        }
    }
}

/// Copy rows bottom to top.
fn flip_vertical(buffer: &PixelBuffer) -> Result<PixelBuffer, TransformError> {
    let row_len = buffer.width() as usize * CHANNELS;
    let mut output = Vec::with_capacity(buffer.as_bytes().len());
    for row in buffer.as_bytes().chunks_exact(row_len).rev() {
        output.extend_from_slice(row);
    }
    PixelBuffer::new(buffer.width(), buffer.height(), output)
        .map_err(|e| TransformError::Failed(format!("flip vertical: {e}")))
}

/// Copy each row's pixels right to left.
fn flip_horizontal(buffer: &PixelBuffer) -> Result<PixelBuffer, TransformError> {
    let row_len = buffer.width() as usize * CHANNELS;
    let mut output = Vec::with_capacity(buffer.as_bytes().len());
    for row in buffer.as_bytes().chunks_exact(row_len) {
        for pixel in row.chunks_exact(CHANNELS).rev() {
            output.extend_from_slice(pixel);
        }
    }
    PixelBuffer::new(buffer.width(), buffer.height(), output)
        .map_err(|e| TransformError::Failed(format!("flip horizontal: {e}")))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn buffer_strategy() -> impl Strategy<Value = PixelBuffer> {
        (1u32..=24, 1u32..=24).prop_flat_map(|(w, h)| {
            let len = (w * h) as usize * CHANNELS;
            prop::collection::vec(any::<u8>(), len..=len)
                .prop_map(move |pixels| PixelBuffer::new(w, h, pixels).unwrap())
        })
    }

    proptest! {
        /// Property: flipping twice along the same axis restores the original.
        #[test]
        fn prop_double_flip_is_identity(buffer in buffer_strategy(), axis in 0u8..3) {
            let axis = match axis {
                0 => FlipAxis::Vertical,
                1 => FlipAxis::Horizontal,
                _ => FlipAxis::Both,
            };
            let once = flip(&buffer, axis).unwrap();
            let twice = flip(&once, axis).unwrap();
            prop_assert_eq!(twice, buffer);
        }
    }
}
