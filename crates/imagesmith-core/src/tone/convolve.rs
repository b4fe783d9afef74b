//! 3x3 convolution filters.
//!
//! Each output channel is
//!
//! ```text
//! out = clamp(sum(kernel[j][i] * src[y + j - 1][x + i - 1]) / divisor + offset, 0, 255)
//! ```
//!
//! with neighbor coordinates clamped to the image edge. Alpha is copied from
//! the source pixel.

use super::ToneError;
use crate::buffer::PixelBuffer;

/// A 3x3 convolution kernel with its divisor and offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    pub weights: [[f32; 3]; 3],
    pub divisor: f32,
    pub offset: f32,
}

impl Kernel {
    pub const EDGE_DETECT: Kernel = Kernel {
        weights: [[-1.0, 0.0, -1.0], [0.0, 4.0, 0.0], [-1.0, 0.0, -1.0]],
        divisor: 1.0,
        offset: 127.0,
    };

    pub const EMBOSS: Kernel = Kernel {
        weights: [[1.5, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, -1.5]],
        divisor: 1.0,
        offset: 127.0,
    };

    pub const GAUSSIAN: Kernel = Kernel {
        weights: [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]],
        divisor: 16.0,
        offset: 0.0,
    };

    pub const MEAN_REMOVAL: Kernel = Kernel {
        weights: [[-1.0, -1.0, -1.0], [-1.0, 9.0, -1.0], [-1.0, -1.0, -1.0]],
        divisor: 1.0,
        offset: 0.0,
    };

    /// Box smoothing with a weighted center: `[1,1,1; 1,w,1; 1,1,1] / (w + 8)`.
    pub fn smooth(weight: f32) -> Result<Kernel, ToneError> {
        let divisor = weight + 8.0;
        if !weight.is_finite() || divisor == 0.0 {
            return Err(ToneError::InvalidParameter(format!(
                "smoothing weight {weight} leaves a zero divisor"
            )));
        }
        Ok(Kernel {
            weights: [[1.0, 1.0, 1.0], [1.0, weight, 1.0], [1.0, 1.0, 1.0]],
            divisor,
            offset: 0.0,
        })
    }

    /// Convolve `buffer` with this kernel.
    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let mut output = buffer.clone();
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let mut sums = [0.0f32; 3];
                for_each_neighbor(buffer, x, y, |i, j, pixel| {
                    let weight = self.weights[j][i];
                    for (sum, &value) in sums.iter_mut().zip(&pixel[..3]) {
                        *sum += weight * value as f32;
                    }
                });

                let alpha = buffer.pixel(x, y)[3];
                let [r, g, b] = sums.map(|sum| to_channel(sum / self.divisor + self.offset));
                output.put_pixel(x, y, [r, g, b, alpha]);
            }
        }
        output
    }
}

/// Visit the 3x3 neighborhood of `(x, y)` with edge clamping.
/// The callback receives the kernel column, the kernel row and the pixel.
#[inline]
fn for_each_neighbor(
    buffer: &PixelBuffer,
    x: u32,
    y: u32,
    mut f: impl FnMut(usize, usize, [u8; 4]),
) {
    let max_x = buffer.width() - 1;
    let max_y = buffer.height() - 1;
    for j in 0..3u32 {
        let sy = (y + j).saturating_sub(1).min(max_y);
        for i in 0..3u32 {
            let sx = (x + i).saturating_sub(1).min(max_x);
            f(i as usize, j as usize, buffer.pixel(sx, sy));
        }
    }
}

#[inline]
fn to_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

fn repeat(buffer: &PixelBuffer, passes: u32, pass: impl Fn(&PixelBuffer) -> PixelBuffer) -> PixelBuffer {
    let mut output = buffer.clone();
    for _ in 0..passes {
        output = pass(&output);
    }
    output
}

/// Highlight edges. Flat regions become mid gray.
pub fn edge_detect(buffer: &PixelBuffer) -> PixelBuffer {
    Kernel::EDGE_DETECT.apply(buffer)
}

/// Relief effect lit from the top-left. Flat regions become mid gray.
pub fn emboss(buffer: &PixelBuffer) -> PixelBuffer {
    Kernel::EMBOSS.apply(buffer)
}

/// Gaussian blur applied `passes` times. Zero passes returns a copy.
pub fn blur(buffer: &PixelBuffer, passes: u32) -> PixelBuffer {
    repeat(buffer, passes, |b| Kernel::GAUSSIAN.apply(b))
}

/// Sketch-like sharpening that subtracts the neighborhood mean.
pub fn remove_mean(buffer: &PixelBuffer) -> PixelBuffer {
    Kernel::MEAN_REMOVAL.apply(buffer)
}

/// Weighted box smoothing. Larger weights keep more of the center pixel.
pub fn smooth(buffer: &PixelBuffer, weight: f32) -> Result<PixelBuffer, ToneError> {
    Ok(Kernel::smooth(weight)?.apply(buffer))
}

/// Edge-preserving blur applied `passes` times.
///
/// Each neighbor is weighted per channel by `1 / |neighbor - center|`, or 1
/// when the two are equal, so similar pixels dominate and edges survive.
pub fn selective_blur(buffer: &PixelBuffer, passes: u32) -> PixelBuffer {
    repeat(buffer, passes, selective_blur_pass)
}

fn selective_blur_pass(buffer: &PixelBuffer) -> PixelBuffer {
    let mut output = buffer.clone();
    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            let center = buffer.pixel(x, y);
            // (weighted sum, total weight) per color channel
            let mut sums = [(0.0f32, 0.0f32); 3];

            for_each_neighbor(buffer, x, y, |_, _, pixel| {
                for ((sum, &value), &base) in sums.iter_mut().zip(&pixel[..3]).zip(&center[..3]) {
                    let diff = (value as f32 - base as f32).abs();
                    let weight = if diff == 0.0 { 1.0 } else { 1.0 / diff };
                    sum.0 += weight * value as f32;
                    sum.1 += weight;
                }
            });

            let mut out = center;
            for (channel, (weighted, total)) in out.iter_mut().zip(sums) {
                *channel = to_channel(weighted / total);
            }
            output.put_pixel(x, y, out);
        }
    }
    output
}
