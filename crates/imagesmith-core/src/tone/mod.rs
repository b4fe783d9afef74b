//! Tone transforms: grayscale, the duotone monochrome remap and the simple
//! per-pixel and convolution filters.
//!
//! Tone transforms never change dimensions. Like the geometric transforms they
//! read a borrowed [`PixelBuffer`](crate::PixelBuffer) and return a new one.
//! Alpha is carried through unchanged unless a filter says otherwise.

use thiserror::Error;

mod convolve;
mod filters;
mod grayscale;
mod monochrome;

pub use convolve::{blur, edge_detect, emboss, remove_mean, selective_blur, smooth, Kernel};
pub use filters::{brightness, colorize, contrast, negative, pixelate};
pub use grayscale::grayscale;
pub use monochrome::monochrome;

/// Errors raised by tone transforms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToneError {
    /// A filter parameter has no meaningful result (zero block size,
    /// a smoothing weight that cancels the kernel divisor).
    #[error("Invalid filter parameter: {0}")]
    InvalidParameter(String),

    /// Building or compositing an intermediate canvas failed.
    #[error("Tone transform failed: {0}")]
    Failed(String),
}
