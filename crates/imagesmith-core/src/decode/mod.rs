//! Image decoding.
//!
//! Loads JPEG, PNG and GIF sources into an RGBA8 [`PixelBuffer`]. GIFs
//! contribute their first frame only. JPEG EXIF orientation is applied when
//! [`LoadOptions::auto_orient`] is set.
//!
//! Files loaded from disk must carry an extension (`jpg`, `jpeg`, `png`,
//! `gif`) that agrees with the format detected from their contents.

mod orientation;
mod types;

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;

use crate::buffer::PixelBuffer;
use crate::format::ImageFormat;

pub use orientation::get_orientation;
pub use types::{DecodeError, DecodedImage, ExifOrientation, LoadOptions};

/// Detect the format of encoded image bytes from their magic number.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    let detected = image::guess_format(bytes)
        .map_err(|_| DecodeError::UnsupportedFormat("unrecognized image data".to_string()))?;
    ImageFormat::from_image_format(detected)
        .ok_or_else(|| DecodeError::UnsupportedFormat(format!("{detected:?}")))
}

/// Decode encoded image bytes into an RGBA8 buffer.
pub fn decode_image(bytes: &[u8], options: &LoadOptions) -> Result<DecodedImage, DecodeError> {
    let format = detect_format(bytes)?;

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format.to_image_format());
    let mut img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if options.auto_orient && format == ImageFormat::Jpeg {
        let exif_orientation = get_orientation(bytes);
        if exif_orientation != ExifOrientation::Normal {
            tracing::debug!(?exif_orientation, "applying EXIF orientation");
            img = orientation::apply_orientation(img, exif_orientation);
        }
    }

    let buffer = PixelBuffer::from_rgba_image(img.into_rgba8())
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    Ok(DecodedImage { buffer, format })
}

/// Read and decode an image file.
///
/// # Errors
///
/// - `NotFound` if `path` is not an existing file
/// - `Io` if it cannot be read
/// - `UnsupportedFormat` if the extension or the contents are not a supported format
/// - `ExtensionMismatch` if the two disagree
pub fn read_image_file(path: &Path, options: &LoadOptions) -> Result<DecodedImage, DecodeError> {
    if !path.is_file() {
        return Err(DecodeError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let expected = ImageFormat::from_extension(extension)
        .ok_or_else(|| DecodeError::UnsupportedFormat(format!("extension {extension:?}")))?;

    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let detected = detect_format(&bytes)?;
    if detected != expected {
        return Err(DecodeError::ExtensionMismatch {
            extension: expected,
            detected,
        });
    }

    decode_image(&bytes, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn encoded(format: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 40) as u8, (y * 40) as u8, 90, 255])
        });
        let mut bytes = Cursor::new(Vec::new());
        if format == image::ImageFormat::Jpeg {
            image::DynamicImage::ImageRgba8(img)
                .into_rgb8()
                .write_to(&mut bytes, format)
                .unwrap();
        } else {
            img.write_to(&mut bytes, format).unwrap();
        }
        bytes.into_inner()
    }

    /// Insert an EXIF APP1 segment carrying `orientation` right after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        #[rustfmt::skip]
        let tiff: [u8; 26] = [
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08,
            0x00, 0x01,
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, orientation, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);
        let length = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_png_is_lossless() {
        let bytes = encoded(image::ImageFormat::Png, 4, 3);
        let decoded = decode_image(&bytes, &LoadOptions::default()).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.buffer.dimensions(), (4, 3));
        assert_eq!(decoded.buffer.pixel(2, 1), [80, 40, 90, 255]);
    }

    #[test]
    fn test_decode_gif_and_jpeg() {
        let gif = decode_image(&encoded(image::ImageFormat::Gif, 5, 2), &LoadOptions::default())
            .unwrap();
        assert_eq!(gif.format, ImageFormat::Gif);
        assert_eq!(gif.buffer.dimensions(), (5, 2));

        let jpeg = decode_image(&encoded(image::ImageFormat::Jpeg, 6, 7), &LoadOptions::default())
            .unwrap();
        assert_eq!(jpeg.format, ImageFormat::Jpeg);
        assert_eq!(jpeg.buffer.dimensions(), (6, 7));
        assert!(jpeg.buffer.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_unsupported_and_corrupt_data() {
        assert!(matches!(
            decode_image(&[0x00, 0x01, 0x02, 0x03], &LoadOptions::default()),
            Err(DecodeError::UnsupportedFormat(_))
        ));
        // Bitmap magic is recognized but not supported
        assert!(matches!(
            decode_image(b"BM\0\0\0\0\0\0\0\0\0\0\0\0", &LoadOptions::default()),
            Err(DecodeError::UnsupportedFormat(_))
        ));

        let png = encoded(image::ImageFormat::Png, 8, 8);
        assert!(matches!(
            decode_image(&png[..png.len() / 2], &LoadOptions::default()),
            Err(DecodeError::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_exif_orientation_applied_only_when_requested() {
        let jpeg = with_exif_orientation(&encoded(image::ImageFormat::Jpeg, 8, 4), 6);
        assert_eq!(get_orientation(&jpeg), ExifOrientation::Rotate90CW);

        let raw = decode_image(&jpeg, &LoadOptions::default()).unwrap();
        assert_eq!(raw.buffer.dimensions(), (8, 4));

        let oriented = decode_image(&jpeg, &LoadOptions { auto_orient: true }).unwrap();
        assert_eq!(oriented.buffer.dimensions(), (4, 8));
    }

    #[test]
    fn test_read_image_file_checks() {
        let dir = tempfile::tempdir().unwrap();
        let png = encoded(image::ImageFormat::Png, 3, 3);

        let good = dir.path().join("picture.PNG");
        std::fs::write(&good, &png).unwrap();
        let decoded = read_image_file(&good, &LoadOptions::default()).unwrap();
        assert_eq!(decoded.buffer.dimensions(), (3, 3));

        let mislabeled = dir.path().join("picture.jpg");
        std::fs::write(&mislabeled, &png).unwrap();
        assert!(matches!(
            read_image_file(&mislabeled, &LoadOptions::default()),
            Err(DecodeError::ExtensionMismatch {
                extension: ImageFormat::Jpeg,
                detected: ImageFormat::Png
            })
        ));

        let unknown = dir.path().join("picture.bmp");
        std::fs::write(&unknown, &png).unwrap();
        assert!(matches!(
            read_image_file(&unknown, &LoadOptions::default()),
            Err(DecodeError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            read_image_file(&dir.path().join("missing.png"), &LoadOptions::default()),
            Err(DecodeError::NotFound(_))
        ));
        assert!(matches!(
            read_image_file(dir.path(), &LoadOptions::default()),
            Err(DecodeError::NotFound(_))
        ));
    }

    #[test]
    fn test_decoded_buffer_matches_source_pixels() {
        let source = PixelBuffer::filled(2, 2, Color::Opaque([1, 2, 3])).unwrap();
        let mut bytes = Cursor::new(Vec::new());
        source
            .to_rgba_image()
            .unwrap()
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image(bytes.get_ref(), &LoadOptions::default()).unwrap();
        assert_eq!(decoded.buffer, source);
    }
}
