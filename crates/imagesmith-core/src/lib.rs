//! Imagesmith Core - single image manipulation library
//!
//! Load a JPEG, PNG or GIF, run it through geometric transforms (scale,
//! resize with fit/cover/stretch, rotate, flip) and tone transforms
//! (grayscale, duotone monochrome, simple filters), then export it again.
//!
//! [`ImageSession`] ties the pieces together. The modules underneath are
//! usable on their own: every transform is a plain function from a borrowed
//! [`PixelBuffer`] to a new one.

pub mod buffer;
pub mod color;
pub mod decode;
pub mod encode;
pub mod format;
pub mod luminance;
pub mod session;
pub mod tone;
pub mod transform;

pub use buffer::{BufferError, ImageMetadata, Orientation, PixelBuffer};
pub use color::{normalize_color, Color, ColorError, ColorFallback, ColorInput, ColorRole};
pub use format::ImageFormat;
pub use session::{
    Destination, Exported, ImageSession, OutputSink, SessionError, SessionOptions, StdoutSink,
};
pub use transform::{FilterType, FlipAxis, ResizePolicy, ResizeSpec, ScaleFactor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_chain() {
        let buffer = PixelBuffer::filled(40, 10, Color::Opaque([200, 30, 30])).unwrap();
        let mut session = ImageSession::from_buffer(buffer, SessionOptions::default());

        session.resize("20x20:cover".parse().unwrap()).unwrap();
        session.flip(FlipAxis::Horizontal).unwrap();
        session.grayscale().unwrap();

        let meta = session.metadata().unwrap();
        assert_eq!((meta.width, meta.height), (20, 20));
        assert_eq!(meta.orientation, Orientation::Square);

        let pixel = session.buffer().unwrap().pixel(10, 10);
        assert_eq!(pixel[0], pixel[1]);
        assert_eq!(pixel[1], pixel[2]);
    }
}
