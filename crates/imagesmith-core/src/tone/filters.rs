//! Per-pixel filters and pixelation.

use super::ToneError;
use crate::buffer::PixelBuffer;
use crate::color::{normalize_or_default, Color, ColorFallback, ColorInput, ColorRole};

/// Largest accepted brightness or contrast magnitude.
const MAX_AMOUNT: i32 = 100;

fn map_rgb(buffer: &PixelBuffer, f: impl Fn(u8) -> u8) -> PixelBuffer {
    let mut output = buffer.clone();
    for pixel in output.pixels_mut() {
        for channel in &mut pixel[..3] {
            *channel = f(*channel);
        }
    }
    output
}

/// Invert every RGB channel.
pub fn negative(buffer: &PixelBuffer) -> PixelBuffer {
    map_rgb(buffer, |v| 255 - v)
}

/// Add `amount` to every RGB channel.
///
/// `amount` is clamped to -100..=100. Negative values darken.
pub fn brightness(buffer: &PixelBuffer, amount: i32) -> PixelBuffer {
    let amount = amount.clamp(-MAX_AMOUNT, MAX_AMOUNT);
    map_rgb(buffer, |v| (v as i32 + amount).clamp(0, 255) as u8)
}

/// Stretch or compress channels around mid gray.
///
/// `amount` is clamped to -100..=100. Positive values increase contrast,
/// -100 collapses everything to mid gray.
///
/// Formula: `output = (input - 0.5) * ((100 + amount) / 100)^2 + 0.5`
pub fn contrast(buffer: &PixelBuffer, amount: i32) -> PixelBuffer {
    let amount = amount.clamp(-MAX_AMOUNT, MAX_AMOUNT);
    let factor = ((MAX_AMOUNT + amount) as f32 / MAX_AMOUNT as f32).powi(2);
    map_rgb(buffer, |v| {
        let normalized = v as f32 / 255.0;
        let adjusted = (normalized - 0.5) * factor + 0.5;
        (adjusted * 255.0).clamp(0.0, 255.0).round() as u8
    })
}

/// Add a color to every pixel, clamping each channel.
///
/// An unparseable color is replaced by black, which leaves the image as is,
/// and reported through the returned fallback.
pub fn colorize(buffer: &PixelBuffer, color: &ColorInput) -> (PixelBuffer, Option<ColorFallback>) {
    let (color, fallback) = normalize_or_default(color, Color::BLACK, ColorRole::Colorize);
    let rgb = color.rgb();

    let mut output = buffer.clone();
    for pixel in output.pixels_mut() {
        for (channel, add) in pixel[..3].iter_mut().zip(rgb) {
            *channel = channel.saturating_add(add);
        }
    }
    (output, fallback)
}

/// Replace each `block` x `block` tile with a single color.
///
/// With `advanced` the tile takes the average of its pixels (alpha included);
/// otherwise it takes the color of its top-left pixel. Tiles on the right and
/// bottom edges may be smaller. A block size of 1 returns a copy.
pub fn pixelate(buffer: &PixelBuffer, block: u32, advanced: bool) -> Result<PixelBuffer, ToneError> {
    if block == 0 {
        return Err(ToneError::InvalidParameter(
            "pixelate block size must be at least 1".to_string(),
        ));
    }

    let mut output = buffer.clone();
    if block == 1 {
        return Ok(output);
    }

    let (width, height) = buffer.dimensions();
    for tile_y in (0..height).step_by(block as usize) {
        for tile_x in (0..width).step_by(block as usize) {
            let x_end = (tile_x + block).min(width);
            let y_end = (tile_y + block).min(height);

            let color = if advanced {
                tile_average(buffer, tile_x..x_end, tile_y..y_end)
            } else {
                buffer.pixel(tile_x, tile_y)
            };

            for y in tile_y..y_end {
                for x in tile_x..x_end {
                    output.put_pixel(x, y, color);
                }
            }
        }
    }
    Ok(output)
}

fn tile_average(
    buffer: &PixelBuffer,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
) -> [u8; 4] {
    let mut sums = [0u64; 4];
    let mut count = 0u64;
    for y in ys {
        for x in xs.clone() {
            for (sum, value) in sums.iter_mut().zip(buffer.pixel(x, y)) {
                *sum += value as u64;
            }
            count += 1;
        }
    }
    sums.map(|sum| ((sum + count / 2) / count) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::numbered;

    fn single(r: u8, g: u8, b: u8, a: u8) -> PixelBuffer {
        PixelBuffer::new(1, 1, vec![r, g, b, a]).unwrap()
    }

    #[test]
    fn test_negative() {
        let out = negative(&single(0, 100, 255, 9));
        assert_eq!(out.pixel(0, 0), [255, 155, 0, 9]);
    }

    #[test]
    fn test_brightness_clamps_amount_and_channels() {
        let img = single(10, 128, 250, 255);
        assert_eq!(brightness(&img, 20).pixel(0, 0), [30, 148, 255, 255]);
        assert_eq!(brightness(&img, -20).pixel(0, 0), [0, 108, 230, 255]);
        assert_eq!(brightness(&img, 500), brightness(&img, 100));
        assert_eq!(brightness(&img, 0), img);
    }

    #[test]
    fn test_contrast() {
        let img = single(64, 128, 192, 255);
        assert_eq!(contrast(&img, 0), img);

        let more = contrast(&img, 50).pixel(0, 0);
        assert!(more[0] < 64 && more[2] > 192, "got {more:?}");

        let less = contrast(&img, -50).pixel(0, 0);
        assert!(less[0] > 64 && less[2] < 192, "got {less:?}");

        // Fully flattened
        let flat = contrast(&img, -100).pixel(0, 0);
        assert_eq!(&flat[..3], &[128, 128, 128]);
        assert_eq!(contrast(&img, -300), contrast(&img, -100));
    }

    #[test]
    fn test_colorize() {
        let img = single(10, 20, 250, 255);
        let (out, fallback) = colorize(&img, &"#102030".into());
        assert_eq!(out.pixel(0, 0), [26, 52, 255, 255]);
        assert!(fallback.is_none());
    }

    #[test]
    fn test_colorize_invalid_is_noop() {
        let img = numbered(4, 4);
        let (out, fallback) = colorize(&img, &"???".into());
        assert_eq!(out, img);
        assert_eq!(fallback.unwrap().role, ColorRole::Colorize);
    }

    #[test]
    fn test_pixelate_simple() {
        let img = numbered(5, 5);
        let out = pixelate(&img, 2, false).unwrap();
        assert_eq!(out.pixel(1, 1), img.pixel(0, 0));
        assert_eq!(out.pixel(3, 0), img.pixel(2, 0));
        // Partial edge tile
        assert_eq!(out.pixel(4, 4), img.pixel(4, 4));
    }

    #[test]
    fn test_pixelate_advanced_averages() {
        let mut pixels = Vec::new();
        for v in [0u8, 100, 200, 100] {
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
        let img = PixelBuffer::new(2, 2, pixels).unwrap();
        let out = pixelate(&img, 2, true).unwrap();
        assert!(out.pixels().all(|p| p == [100, 100, 100, 255]));
    }

    #[test]
    fn test_pixelate_block_sizes() {
        let img = numbered(3, 3);
        assert!(matches!(
            pixelate(&img, 0, true),
            Err(ToneError::InvalidParameter(_))
        ));
        assert_eq!(pixelate(&img, 1, true).unwrap(), img);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: negating twice restores the original.
        #[test]
        fn prop_double_negative(r: u8, g: u8, b: u8, a: u8) {
            let img = PixelBuffer::new(1, 1, vec![r, g, b, a]).unwrap();
            prop_assert_eq!(negative(&negative(&img)), img);
        }

        /// Property: brightness never touches alpha and moves channels monotonically.
        #[test]
        fn prop_brightness_monotonic(v: u8, a: u8, amount in -100i32..=100) {
            let img = PixelBuffer::new(1, 1, vec![v, v, v, a]).unwrap();
            let out = brightness(&img, amount).pixel(0, 0);
            prop_assert_eq!(out[3], a);
            if amount >= 0 {
                prop_assert!(out[0] >= v);
            } else {
                prop_assert!(out[0] <= v);
            }
        }
    }
}
