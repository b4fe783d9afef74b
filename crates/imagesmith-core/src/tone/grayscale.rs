//! Luma grayscale.

use crate::buffer::PixelBuffer;
use crate::luminance::calculate_luma_u8;

/// Replace every pixel's RGB with its BT.601 luma. Alpha is preserved.
///
/// After conversion `R == G == B`, so any channel can be read back as luma.
pub fn grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    let mut output = buffer.clone();
    for pixel in output.pixels_mut() {
        let luma = calculate_luma_u8(pixel[0], pixel[1], pixel[2]);
        pixel[0] = luma;
        pixel[1] = luma;
        pixel[2] = luma;
    }
    output
}
