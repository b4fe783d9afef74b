//! Owned RGBA8 pixel buffers and the dimension metadata derived from them.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Errors raised when building a [`PixelBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel data length doesn't match the dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },
}

/// A decoded true-color raster.
///
/// Pixels are straight-alpha RGBA8 in row-major order, top row first.
/// A buffer never changes size: every transform produces a new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer from raw RGBA8 data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(BufferError::InvalidPixelData {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        let rgba = color.to_rgba().0;
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wrap an `image::RgbaImage`.
    pub fn from_rgba_image(img: RgbaImage) -> Result<Self, BufferError> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `image::RgbaImage` for use with `image::imageops`.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Consume into an `image::RgbaImage`.
    pub fn into_rgba_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.index(x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Overwrite the pixel at `(x, y)` without blending.
    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + CHANNELS].copy_from_slice(&rgba);
    }

    /// Iterate over pixels as `[r, g, b, a]` slices.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(CHANNELS)
    }

    /// Mutable pixel iteration, used by the in-place tone filters.
    pub(crate) fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.pixels.chunks_exact_mut(CHANNELS)
    }

    /// Dimension metadata for this buffer.
    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata::from_dimensions(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

/// Layout of an image, derived from its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Wider than tall.
    Landscape,
    /// Taller than wide.
    Portrait,
    Square,
}

impl Orientation {
    pub fn from_aspect(aspect: f64) -> Self {
        if aspect > 1.0 {
            Orientation::Landscape
        } else if aspect < 1.0 {
            Orientation::Portrait
        } else {
            Orientation::Square
        }
    }
}

/// Dimension metadata kept alongside the current buffer.
///
/// Recomputed after every geometric transform. Tone transforms never change
/// dimensions and leave it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// `width / height`.
    pub aspect: f64,
    pub orientation: Orientation,
}

impl ImageMetadata {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let aspect = width as f64 / height as f64;
        Self {
            width,
            height,
            aspect,
            orientation: Orientation::from_aspect(aspect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            PixelBuffer::new(2, 2, vec![0; 12]),
            Err(BufferError::InvalidPixelData {
                expected: 16,
                actual: 12
            })
        );
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert!(matches!(
            PixelBuffer::new(0, 5, vec![]),
            Err(BufferError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            PixelBuffer::filled(5, 0, Color::WHITE),
            Err(BufferError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_filled() {
        let buf = PixelBuffer::filled(3, 2, Color::Opaque([1, 2, 3])).unwrap();
        assert_eq!(buf.pixel_count(), 6);
        assert!(buf.pixels().all(|p| p == [1, 2, 3, 255]));
    }

    #[test]
    fn test_put_and_get_pixel() {
        let mut buf = PixelBuffer::filled(4, 4, Color::BLACK).unwrap();
        buf.put_pixel(3, 2, [9, 8, 7, 6]);
        assert_eq!(buf.pixel(3, 2), [9, 8, 7, 6]);
        assert_eq!(buf.pixel(2, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn test_rgba_image_conversion() {
        let buf = PixelBuffer::filled(5, 3, Color::WHITE).unwrap();
        let img = buf.to_rgba_image().unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        let back = PixelBuffer::from_rgba_image(img).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn test_orientation() {
        assert_eq!(
            ImageMetadata::from_dimensions(400, 100).orientation,
            Orientation::Landscape
        );
        assert_eq!(
            ImageMetadata::from_dimensions(100, 400).orientation,
            Orientation::Portrait
        );
        assert_eq!(
            ImageMetadata::from_dimensions(64, 64).orientation,
            Orientation::Square
        );
    }

    #[test]
    fn test_aspect() {
        let meta = ImageMetadata::from_dimensions(200, 50);
        assert!((meta.aspect - 4.0).abs() < f64::EPSILON);
    }
}
