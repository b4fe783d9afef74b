//! Duotone monochrome remap.
//!
//! The image is first reduced to grayscale. Luma then drives the opacity of
//! one of the two endpoint colors:
//!
//! - Black endpoint transparent: the white color is painted onto a transparent
//!   canvas with transparency `127 - round(127 * luma / 255)`, so bright pixels
//!   become opaque white and dark pixels vanish.
//! - Otherwise: the black color is painted with transparency
//!   `round(127 * luma / 255)` onto a transparent layer that is composited over
//!   a canvas filled with the white color, so dark pixels become opaque black.
//!
//! Transparencies use the 0 (opaque) to 127 (transparent) scale and are
//! converted to 0-255 alpha only when the pixel is written.

use image::RgbaImage;

use super::{grayscale, ToneError};
use crate::buffer::PixelBuffer;
use crate::color::{
    normalize_or_default, transparency_to_alpha, Color, ColorFallback, ColorInput, ColorRole,
    MAX_TRANSPARENCY,
};

/// RGB painted for a fully transparent white endpoint.
const TRANSPARENT_WHITE_RGB: [u8; 3] = [255, 255, 255];

/// Remap `buffer` onto the gradient between `white` and `black`.
///
/// Either endpoint may be `transparent`. Unparseable endpoints fall back to
/// pure white or pure black and are reported in the returned fallbacks.
/// Pure white with pure black is plain grayscale.
pub fn monochrome(
    buffer: &PixelBuffer,
    white: &ColorInput,
    black: &ColorInput,
) -> Result<(PixelBuffer, Vec<ColorFallback>), ToneError> {
    let (white, white_fallback) =
        normalize_or_default(white, Color::WHITE, ColorRole::MonochromeWhite);
    let (black, black_fallback) =
        normalize_or_default(black, Color::BLACK, ColorRole::MonochromeBlack);
    let fallbacks: Vec<ColorFallback> = white_fallback.into_iter().chain(black_fallback).collect();

    let gray = grayscale(buffer);
    if white == Color::WHITE && black == Color::BLACK {
        return Ok((gray, fallbacks));
    }

    let output = if black.is_transparent() {
        paint_white_over_transparent(&gray, white)?
    } else {
        composite_black_over_white(&gray, white, black)?
    };

    tracing::debug!(%white, %black, "applied monochrome remap");
    Ok((output, fallbacks))
}

fn endpoint_rgb(color: Color, transparent_rgb: [u8; 3]) -> [u8; 3] {
    if color.is_transparent() {
        transparent_rgb
    } else {
        color.rgb()
    }
}

/// Transparency (0-127) proportional to luma.
#[inline]
fn luma_transparency(luma: u8) -> u8 {
    (MAX_TRANSPARENCY as f32 * luma as f32 / 255.0).round() as u8
}

/// Alpha for a pixel painted at `transparency` with an endpoint of `opacity`.
#[inline]
fn painted_alpha(transparency: u8, opacity: f32) -> u8 {
    (transparency_to_alpha(transparency) as f32 * opacity).round() as u8
}

fn paint_white_over_transparent(gray: &PixelBuffer, white: Color) -> Result<PixelBuffer, ToneError> {
    let [r, g, b] = endpoint_rgb(white, TRANSPARENT_WHITE_RGB);
    let opacity = white.opacity();

    let mut base = PixelBuffer::filled(gray.width(), gray.height(), Color::Transparent)
        .map_err(|e| ToneError::Failed(e.to_string()))?;
    for (dst, src) in base.pixels_mut().zip(gray.pixels()) {
        let transparency = MAX_TRANSPARENCY - luma_transparency(src[0]);
        dst.copy_from_slice(&[r, g, b, painted_alpha(transparency, opacity)]);
    }
    Ok(base)
}

fn composite_black_over_white(
    gray: &PixelBuffer,
    white: Color,
    black: Color,
) -> Result<PixelBuffer, ToneError> {
    let (width, height) = gray.dimensions();
    let [wr, wg, wb] = endpoint_rgb(white, TRANSPARENT_WHITE_RGB);
    let base_alpha = transparency_to_alpha(white.transparency());
    let mut base = RgbaImage::from_pixel(width, height, image::Rgba([wr, wg, wb, base_alpha]));

    let [r, g, b] = black.rgb();
    let opacity = black.opacity();
    let mut top = RgbaImage::new(width, height);
    for (dst, src) in top.pixels_mut().zip(gray.pixels()) {
        let transparency = luma_transparency(src[0]);
        *dst = image::Rgba([r, g, b, painted_alpha(transparency, opacity)]);
    }

    image::imageops::overlay(&mut base, &top, 0, 0);
    PixelBuffer::from_rgba_image(base).map_err(|e| ToneError::Failed(e.to_string()))
}
