//! GIF encoding. The palette is quantized from the RGBA buffer.

use image::codecs::gif::GifEncoder;
use image::ExtendedColorType;

use super::EncodeError;
use crate::buffer::PixelBuffer;
use crate::format::ImageFormat;

/// Map a 0-100 quality onto the quantizer speed (1 = best, 30 = fastest).
pub fn gif_speed(quality: u8) -> i32 {
    let speed = 30 - (quality as f32 * 29.0 / 100.0).round() as i32;
    speed.clamp(1, 30)
}

/// Encode a buffer as a single-frame GIF.
pub fn encode_gif(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut output = Vec::new();
    {
        // The trailer is written when the encoder is dropped
        let mut encoder = GifEncoder::new_with_speed(&mut output, gif_speed(quality));
        encoder
            .encode(
                buffer.as_bytes(),
                buffer.width(),
                buffer.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| EncodeError::failed(ImageFormat::Gif, e))?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::gradient;

    #[test]
    fn test_speed_mapping() {
        assert_eq!(gif_speed(0), 30);
        assert_eq!(gif_speed(100), 1);
        assert_eq!(gif_speed(50), 15);
    }

    #[test]
    fn test_gif_header_and_trailer() {
        let gif = encode_gif(&gradient(9, 4), 50).unwrap();
        assert_eq!(&gif[..6], b"GIF89a");
        assert_eq!(gif.last(), Some(&0x3B));
    }
}
