//! Core types for image decoding.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::PixelBuffer;
use crate::format::ImageFormat;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file does not exist or is not a regular file.
    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The format is not JPEG, PNG or GIF.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The extension names a different format than the file contents.
    #[error("File extension says {extension} but contents are {detected}")]
    ExtensionMismatch {
        extension: ImageFormat,
        detected: ImageFormat,
    },

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

/// Options applied while loading an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Rotate or mirror JPEGs according to their EXIF orientation tag.
    pub auto_orient: bool,
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExifOrientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for ExifOrientation {
    fn from(value: u32) -> Self {
        match value {
            2 => ExifOrientation::FlipHorizontal,
            3 => ExifOrientation::Rotate180,
            4 => ExifOrientation::FlipVertical,
            5 => ExifOrientation::Transpose,
            6 => ExifOrientation::Rotate90CW,
            7 => ExifOrientation::Transverse,
            8 => ExifOrientation::Rotate270CW,
            _ => ExifOrientation::Normal,
        }
    }
}

/// A decoded image and the format it was stored in.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub buffer: PixelBuffer,
    pub format: ImageFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(ExifOrientation::from(1), ExifOrientation::Normal);
        assert_eq!(ExifOrientation::from(6), ExifOrientation::Rotate90CW);
        for value in 1..=8u32 {
            assert_eq!(ExifOrientation::from(value) as u32, value);
        }
        assert_eq!(ExifOrientation::from(99), ExifOrientation::Normal);
    }

    #[test]
    fn test_load_options_default() {
        assert!(!LoadOptions::default().auto_orient);
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ExtensionMismatch {
            extension: ImageFormat::Png,
            detected: ImageFormat::Jpeg,
        };
        assert_eq!(err.to_string(), "File extension says png but contents are jpeg");

        let err = DecodeError::UnsupportedFormat("bmp".to_string());
        assert_eq!(err.to_string(), "Unsupported image format: bmp");
    }
}
