//! The image session: load, a chain of transforms, export.
//!
//! An [`ImageSession`] owns at most one [`PixelBuffer`] and the
//! [`ImageMetadata`] derived from it. Each transform builds a complete
//! replacement buffer before swapping it in, so a failed transform leaves the
//! session exactly as it was.
//!
//! # Example
//!
//! ```ignore
//! use imagesmith_core::{Destination, ImageFormat, ImageSession, ResizeSpec};
//!
//! let mut session = ImageSession::open("photo.jpg")?;
//! session.resize("200x200:cover".parse()?)?;
//! session.monochrome("#FFF", "#203040")?;
//! session.export(ImageFormat::Png, 80, Destination::Path("out/".into()))?;
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::buffer::{ImageMetadata, PixelBuffer};
use crate::color::{ColorError, ColorFallback, ColorInput};
use crate::decode::{self, DecodeError, LoadOptions};
use crate::encode::{self, EncodeError};
use crate::format::ImageFormat;
use crate::tone::{self, ToneError};
use crate::transform::{self, FilterType, FlipAxis, ResizeSpec, ScaleFactor, TransformError};

/// Errors raised by [`ImageSession`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A transform or export was requested before any image was loaded.
    #[error("No image is loaded")]
    NotLoaded,

    /// The source or requested format is not JPEG, PNG or GIF.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The source could not be found, read or decoded.
    #[error("Decoding failed: {0}")]
    DecodeFailed(#[source] DecodeError),

    #[error("Encoding failed: {0}")]
    EncodeFailed(#[from] EncodeError),

    /// A color that has no default to fall back on was invalid.
    #[error(transparent)]
    InvalidColor(#[from] ColorError),

    /// A size, factor or angle has no meaningful result.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A transform primitive failed. The current buffer is unchanged.
    #[error("Transform failed: {0}")]
    TransformFailed(String),

    /// The export destination needs the source path but there is none.
    #[error("No source path to derive the export destination from")]
    NoSourcePath,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        SessionError::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<DecodeError> for SessionError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat(_) | DecodeError::ExtensionMismatch { .. } => {
                SessionError::UnsupportedFormat(err.to_string())
            }
            other => SessionError::DecodeFailed(other),
        }
    }
}

impl From<TransformError> for SessionError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::InvalidDimensions(message) => SessionError::InvalidDimensions(message),
            TransformError::InvalidColor(color) => SessionError::InvalidColor(color),
            TransformError::Failed(message) => SessionError::TransformFailed(message),
        }
    }
}

impl From<ToneError> for SessionError {
    fn from(err: ToneError) -> Self {
        SessionError::TransformFailed(err.to_string())
    }
}

/// Session-wide configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Resampling filter for scale and resize. Rotation uses the matching
    /// interpolation filter.
    pub filter: FilterType,
    pub load: LoadOptions,
}

/// Where [`ImageSession::export`] writes the encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    /// Standard output, preceded by a content type declaration.
    Sink,
    /// Overwrite the file the image was loaded from.
    #[default]
    Original,
    /// A file path, or a directory when the path has no extension.
    Path(PathBuf),
}

/// Receiver for images exported without a file destination.
pub trait OutputSink {
    /// Announce the content type of the bytes that follow.
    fn declare_content_type(&mut self, mime: &str) -> io::Result<()>;

    fn write_image(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Writes exported images to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    /// Emit a `Content-Type` header block before the image bytes.
    pub with_header: bool,
}

impl OutputSink for StdoutSink {
    fn declare_content_type(&mut self, mime: &str) -> io::Result<()> {
        if self.with_header {
            write!(io::stdout().lock(), "Content-Type: {mime}\r\n\r\n")?;
        } else {
            tracing::debug!(mime, "writing image to stdout");
        }
        Ok(())
    }

    fn write_image(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }
}

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exported {
    File(PathBuf),
    /// Written to an [`OutputSink`]; carries the number of bytes written.
    Sink { bytes: usize },
}

#[derive(Debug, Clone)]
struct Source {
    path: PathBuf,
    format: ImageFormat,
}

#[derive(Debug, Clone)]
struct Current {
    buffer: PixelBuffer,
    metadata: ImageMetadata,
}

impl Current {
    fn new(buffer: PixelBuffer) -> Self {
        let metadata = buffer.metadata();
        Self { buffer, metadata }
    }
}

/// A single image being worked on.
#[derive(Debug, Clone, Default)]
pub struct ImageSession {
    options: SessionOptions,
    source: Option<Source>,
    current: Option<Current>,
}

impl ImageSession {
    /// An empty session. Every transform fails with `NotLoaded` until an
    /// image is loaded.
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            source: None,
            current: None,
        }
    }

    /// Load `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Self::open_with(path, SessionOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self, SessionError> {
        let mut session = Self::new(options);
        session.load(path)?;
        Ok(session)
    }

    /// Decode in-memory bytes. The session has no source path, so exporting
    /// to [`Destination::Original`] fails.
    pub fn from_bytes(bytes: &[u8], options: SessionOptions) -> Result<Self, SessionError> {
        let decoded = decode::decode_image(bytes, &options.load)?;
        tracing::info!(
            format = %decoded.format,
            width = decoded.buffer.width(),
            height = decoded.buffer.height(),
            "decoded image from memory"
        );
        Ok(Self {
            options,
            source: None,
            current: Some(Current::new(decoded.buffer)),
        })
    }

    /// Start from an existing buffer.
    pub fn from_buffer(buffer: PixelBuffer, options: SessionOptions) -> Self {
        Self {
            options,
            source: None,
            current: Some(Current::new(buffer)),
        }
    }

    /// Load an image file, replacing whatever the session held.
    ///
    /// On failure the previous image and source are kept.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<ImageMetadata, SessionError> {
        let path = path.as_ref();
        let decoded = decode::read_image_file(path, &self.options.load)?;
        let current = Current::new(decoded.buffer);
        let metadata = current.metadata;

        tracing::info!(
            format = %decoded.format,
            width = metadata.width,
            height = metadata.height,
            "loaded image"
        );
        self.source = Some(Source {
            path: path.to_path_buf(),
            format: decoded.format,
        });
        self.current = Some(current);
        Ok(metadata)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn metadata(&self) -> Option<&ImageMetadata> {
        self.current.as_ref().map(|current| &current.metadata)
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.current.as_ref().map(|current| &current.buffer)
    }

    pub fn into_buffer(self) -> Option<PixelBuffer> {
        self.current.map(|current| current.buffer)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_ref().map(|source| source.path.as_path())
    }

    /// Format the image was loaded from, if it came from a file.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source.as_ref().map(|source| source.format)
    }

    fn loaded(&self) -> Result<&PixelBuffer, SessionError> {
        self.buffer().ok_or(SessionError::NotLoaded)
    }

    /// Swap in the output of a geometric transform and recompute metadata.
    fn replace_geometry(&mut self, buffer: PixelBuffer) -> ImageMetadata {
        let current = Current::new(buffer);
        let metadata = current.metadata;
        tracing::debug!(width = metadata.width, height = metadata.height, "dimensions changed");
        self.current = Some(current);
        metadata
    }

    /// Swap in the output of a tone transform. Metadata is left alone.
    fn replace_tone(&mut self, buffer: PixelBuffer) {
        if let Some(current) = self.current.as_mut() {
            current.buffer = buffer;
        }
    }

    // ------------------------------------------------------------------
    // Geometric transforms
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub fn scale(&mut self, factor: ScaleFactor) -> Result<ImageMetadata, SessionError> {
        let scaled = transform::scale(self.loaded()?, factor, self.options.filter)?;
        Ok(self.replace_geometry(scaled))
    }

    #[instrument(skip(self))]
    pub fn resize(&mut self, spec: ResizeSpec) -> Result<ImageMetadata, SessionError> {
        let resized = transform::resize(self.loaded()?, spec, self.options.filter)?;
        Ok(self.replace_geometry(resized))
    }

    /// Rotate counter-clockwise by `angle` degrees, filling exposed corners
    /// with `background`. An invalid background fails the call.
    #[instrument(skip(self, background))]
    pub fn rotate(
        &mut self,
        angle: f64,
        background: impl Into<ColorInput>,
    ) -> Result<ImageMetadata, SessionError> {
        let rotated = transform::rotate(
            self.loaded()?,
            angle,
            &background.into(),
            self.options.filter.into(),
        )?;
        Ok(self.replace_geometry(rotated))
    }

    pub fn rotate_clockwise(
        &mut self,
        angle: f64,
        background: impl Into<ColorInput>,
    ) -> Result<ImageMetadata, SessionError> {
        self.rotate(-angle, background)
    }

    pub fn rotate_counterclockwise(
        &mut self,
        angle: f64,
        background: impl Into<ColorInput>,
    ) -> Result<ImageMetadata, SessionError> {
        self.rotate(angle, background)
    }

    /// Quarter turn clockwise.
    pub fn rotate_right(
        &mut self,
        background: impl Into<ColorInput>,
    ) -> Result<ImageMetadata, SessionError> {
        self.rotate(-90.0, background)
    }

    /// Quarter turn counter-clockwise.
    pub fn rotate_left(
        &mut self,
        background: impl Into<ColorInput>,
    ) -> Result<ImageMetadata, SessionError> {
        self.rotate(90.0, background)
    }

    #[instrument(skip(self))]
    pub fn flip(&mut self, axis: FlipAxis) -> Result<ImageMetadata, SessionError> {
        let flipped = transform::flip(self.loaded()?, axis)?;
        Ok(self.replace_geometry(flipped))
    }

    // ------------------------------------------------------------------
    // Tone transforms
    // ------------------------------------------------------------------

    pub fn grayscale(&mut self) -> Result<(), SessionError> {
        let gray = tone::grayscale(self.loaded()?);
        self.replace_tone(gray);
        Ok(())
    }

    /// Duotone remap. Invalid endpoint colors fall back to white and black
    /// and are returned.
    #[instrument(skip(self, white, black))]
    pub fn monochrome(
        &mut self,
        white: impl Into<ColorInput>,
        black: impl Into<ColorInput>,
    ) -> Result<Vec<ColorFallback>, SessionError> {
        let (output, fallbacks) =
            tone::monochrome(self.loaded()?, &white.into(), &black.into())?;
        self.replace_tone(output);
        Ok(fallbacks)
    }

    pub fn negative(&mut self) -> Result<(), SessionError> {
        let output = tone::negative(self.loaded()?);
        self.replace_tone(output);
        Ok(())
    }

    pub fn brightness(&mut self, amount: i32) -> Result<(), SessionError> {
        let output = tone::brightness(self.loaded()?, amount);
        self.replace_tone(output);
        Ok(())
    }

    pub fn contrast(&mut self, amount: i32) -> Result<(), SessionError> {
        let output = tone::contrast(self.loaded()?, amount);
        self.replace_tone(output);
        Ok(())
    }

    pub fn colorize(
        &mut self,
        color: impl Into<ColorInput>,
    ) -> Result<Option<ColorFallback>, SessionError> {
        let (output, fallback) = tone::colorize(self.loaded()?, &color.into());
        self.replace_tone(output);
        Ok(fallback)
    }

    pub fn edge_detect(&mut self) -> Result<(), SessionError> {
        let output = tone::edge_detect(self.loaded()?);
        self.replace_tone(output);
        Ok(())
    }

    pub fn emboss(&mut self) -> Result<(), SessionError> {
        let output = tone::emboss(self.loaded()?);
        self.replace_tone(output);
        Ok(())
    }

    pub fn blur(&mut self, passes: u32) -> Result<(), SessionError> {
        let output = tone::blur(self.loaded()?, passes);
        self.replace_tone(output);
        Ok(())
    }

    pub fn selective_blur(&mut self, passes: u32) -> Result<(), SessionError> {
        let output = tone::selective_blur(self.loaded()?, passes);
        self.replace_tone(output);
        Ok(())
    }

    pub fn remove_mean(&mut self) -> Result<(), SessionError> {
        let output = tone::remove_mean(self.loaded()?);
        self.replace_tone(output);
        Ok(())
    }

    pub fn smooth(&mut self, weight: f32) -> Result<(), SessionError> {
        let output = tone::smooth(self.loaded()?, weight)?;
        self.replace_tone(output);
        Ok(())
    }

    pub fn pixelate(&mut self, block: u32, advanced: bool) -> Result<(), SessionError> {
        let output = tone::pixelate(self.loaded()?, block, advanced)?;
        self.replace_tone(output);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Encode the current image and write it to `destination`.
    ///
    /// File destinations get their parent directory created when missing, and
    /// a trailing `jpg`/`jpeg`/`png`/`gif` extension is rewritten to match
    /// `format`.
    #[instrument(skip(self))]
    pub fn export(
        &self,
        format: ImageFormat,
        quality: u8,
        destination: Destination,
    ) -> Result<Exported, SessionError> {
        let path = match destination {
            Destination::Sink => {
                return self.export_to_sink(format, quality, &mut StdoutSink::default());
            }
            Destination::Original => self.resolve_path(None, format)?,
            Destination::Path(path) => self.resolve_path(Some(&path), format)?,
        };

        let bytes = encode::encode(self.loaded()?, format, quality)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::io(format!("creating {}", parent.display()), e))?;
        }
        std::fs::write(&path, &bytes)
            .map_err(|e| SessionError::io(format!("writing {}", path.display()), e))?;

        tracing::info!(path = %path.display(), size = bytes.len(), "exported image");
        Ok(Exported::File(path))
    }

    /// Encode the current image and hand it to `sink`.
    pub fn export_to_sink(
        &self,
        format: ImageFormat,
        quality: u8,
        sink: &mut dyn OutputSink,
    ) -> Result<Exported, SessionError> {
        let bytes = encode::encode(self.loaded()?, format, quality)?;
        sink.declare_content_type(format.mime_type())
            .map_err(|e| SessionError::io("declaring content type", e))?;
        sink.write_image(&bytes)
            .map_err(|e| SessionError::io("writing image to sink", e))?;

        tracing::info!(%format, size = bytes.len(), "exported image to sink");
        Ok(Exported::Sink { bytes: bytes.len() })
    }

    /// Write the current image to standard output.
    pub fn display(&self, format: ImageFormat, quality: u8) -> Result<Exported, SessionError> {
        self.export(format, quality, Destination::Sink)
    }

    /// Work out the file an export to `requested` (or the source, when
    /// `None`) should write.
    pub fn resolve_path(
        &self,
        requested: Option<&Path>,
        format: ImageFormat,
    ) -> Result<PathBuf, SessionError> {
        let source = self.source_path();
        let mut path = match requested {
            Some(path) => path.to_path_buf(),
            None => source.ok_or(SessionError::NoSourcePath)?.to_path_buf(),
        };

        if path.extension().is_none() {
            let filename = source
                .and_then(Path::file_name)
                .ok_or(SessionError::NoSourcePath)?;
            path.push(filename);
        }

        Ok(with_format_extension(path, format))
    }
}

/// Rewrite a known raster extension to `format`'s. Extensions that already
/// name `format` (`jpeg` for JPEG) and unknown extensions are kept.
fn with_format_extension(path: PathBuf, format: ImageFormat) -> PathBuf {
    let current = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension);
    match current {
        Some(existing) if existing != format => path.with_extension(format.extension()),
        _ => path,
    }
}
