//! Image rotation with bilinear and Lanczos3 interpolation.
//!
//! Rotations by exact multiples of 90 degrees are pixel permutations and go
//! through `image::imageops`. Every other angle uses inverse mapping: for each
//! pixel of the expanded output we find the source position and interpolate
//! it. Output pixels whose source falls outside the image are the exposed
//! corners and take the background color.
//!
//! For a counter-clockwise rotation by θ in y-down image space, the inverse
//! transform is:
//! ```text
//! src_x = dx * cos(θ) - dy * sin(θ) + src_cx
//! src_y = dx * sin(θ) + dy * cos(θ) + src_cy
//! ```
//!
//! Interpolation works on premultiplied alpha so transparent neighbors do not
//! bleed their color into the result.

use image::imageops;
use serde::{Deserialize, Serialize};

use super::{check_pixel_count, FilterType, TransformError};
use crate::buffer::PixelBuffer;
use crate::color::ColorInput;

/// Tolerance, in degrees, for treating an angle as axis-aligned.
const ANGLE_EPSILON: f64 = 0.001;

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation.
    Lanczos3,
}

impl From<FilterType> for InterpolationFilter {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Lanczos3 => InterpolationFilter::Lanczos3,
            FilterType::Nearest | FilterType::Bilinear => InterpolationFilter::Bilinear,
        }
    }
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// # Returns
///
/// Tuple of (new_width, new_height) for the rotated bounding box.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // new_w = |w*cos| + |h*sin|, new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Counter-clockwise quarter turns (0-3) if the angle is axis-aligned.
fn quarter_turns(angle_degrees: f64) -> Option<u8> {
    let normalized = angle_degrees.rem_euclid(360.0);
    [0.0, 90.0, 180.0, 270.0, 360.0]
        .iter()
        .position(|target| (normalized - target).abs() < ANGLE_EPSILON)
        .map(|i| (i % 4) as u8)
}

/// Rotate an image around its center.
///
/// Positive angles rotate counter-clockwise. The output canvas is expanded to
/// fit the whole rotated image and exposed corners are filled with
/// `background`.
///
/// # Errors
///
/// - `TransformError::InvalidColor` if `background` cannot be normalized
/// - `TransformError::InvalidDimensions` if the angle is not finite
pub fn rotate(
    image: &PixelBuffer,
    angle_degrees: f64,
    background: &ColorInput,
    filter: InterpolationFilter,
) -> Result<PixelBuffer, TransformError> {
    if !angle_degrees.is_finite() {
        return Err(TransformError::InvalidDimensions(format!(
            "rotation angle must be finite, got {angle_degrees}"
        )));
    }
    let background = background.normalize()?;

    if let Some(turns) = quarter_turns(angle_degrees) {
        return rotate_quarter_turns(image, turns);
    }

    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width(), image.height(), angle_degrees);
    check_pixel_count(dst_w, dst_h)?;

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    // Center of source and destination images
    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let fill = background.to_rgba().0;
    let mut output = PixelBuffer::filled(dst_w, dst_h, background)
        .map_err(|e| TransformError::Failed(e.to_string()))?;

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Pixel centers, relative to the destination center
            let dx = dst_x as f64 + 0.5 - dst_cx;
            let dy = dst_y as f64 + 0.5 - dst_cy;

            // Back to source pixel-index space
            let src_x = dx * cos - dy * sin + src_cx - 0.5;
            let src_y = dx * sin + dy * cos + src_cy - 0.5;

            if src_x < -0.5 || src_x > src_w - 0.5 || src_y < -0.5 || src_y > src_h - 0.5 {
                continue;
            }

            let pixel = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
            };
            output.put_pixel(dst_x, dst_y, pixel);
        }
    }

    tracing::debug!(
        angle = angle_degrees,
        width = dst_w,
        height = dst_h,
        background = ?fill,
        "rotated"
    );

    Ok(output)
}

fn rotate_quarter_turns(image: &PixelBuffer, turns: u8) -> Result<PixelBuffer, TransformError> {
    if turns == 0 {
        return Ok(image.clone());
    }

    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| TransformError::Failed("failed to create RgbaImage".to_string()))?;

    // imageops rotates clockwise; our turns are counter-clockwise
    let rotated = match turns {
        1 => imageops::rotate270(&rgba),
        2 => imageops::rotate180(&rgba),
        _ => imageops::rotate90(&rgba),
    };

    PixelBuffer::from_rgba_image(rotated).map_err(|e| TransformError::Failed(e.to_string()))
}

/// Get a pixel as premultiplied `[f64; 4]`.
#[inline]
fn get_premultiplied(image: &PixelBuffer, px: u32, py: u32) -> [f64; 4] {
    let [r, g, b, a] = image.pixel(px, py);
    let alpha = a as f64 / 255.0;
    [
        r as f64 * alpha,
        g as f64 * alpha,
        b as f64 * alpha,
        a as f64,
    ]
}

/// Turn accumulated premultiplied channels back into straight RGBA8.
#[inline]
fn unpremultiply(sum: [f64; 4]) -> [u8; 4] {
    let a = sum[3].clamp(0.0, 255.0);
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let alpha = a / 255.0;
    [
        (sum[0] / alpha).clamp(0.0, 255.0).round() as u8,
        (sum[1] / alpha).clamp(0.0, 255.0).round() as u8,
        (sum[2] / alpha).clamp(0.0, 255.0).round() as u8,
        a.round() as u8,
    ]
}

/// Sample a pixel using bilinear interpolation.
///
/// Coordinates within half a pixel of the border clamp to the edge pixels.
fn sample_bilinear(image: &PixelBuffer, x: f64, y: f64) -> [u8; 4] {
    let max_x = (image.width() - 1) as f64;
    let max_y = (image.height() - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_premultiplied(image, x0, y0);
    let p10 = get_premultiplied(image, x1, y0);
    let p01 = get_premultiplied(image, x0, y1);
    let p11 = get_premultiplied(image, x1, y1);

    let (w00, w10) = ((1.0 - fx) * (1.0 - fy), fx * (1.0 - fy));
    let (w01, w11) = ((1.0 - fx) * fy, fx * fy);
    let sum: [f64; 4] =
        std::array::from_fn(|i| p00[i] * w00 + p10[i] * w10 + p01[i] * w01 + p11[i] * w11);

    unpremultiply(sum)
}

/// Sample a pixel using Lanczos3 interpolation.
///
/// Lanczos3 considers a 6x6 neighborhood; near the border it falls back to
/// bilinear.
fn sample_lanczos3(image: &PixelBuffer, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width() as i64, image.height() as i64);

    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        return sample_bilinear(image, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;

            if px >= 0 && px < w && py >= 0 && py < h {
                let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
                let pixel = get_premultiplied(image, px as u32, py as u32);
                for (acc, value) in sum.iter_mut().zip(pixel) {
                    *acc += value * weight;
                }
                weight_sum += weight;
            }
        }
    }

    if weight_sum <= 0.0 {
        return sample_bilinear(image, x, y);
    }
    for channel in &mut sum {
        *channel /= weight_sum;
    }
    unpremultiply(sum)
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
