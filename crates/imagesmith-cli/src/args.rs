use std::path::PathBuf;

use clap::Parser;
use imagesmith_core::encode::DEFAULT_QUALITY;
use imagesmith_core::{FilterType, ImageFormat};

use crate::step::Step;

#[derive(Parser, Debug)]
#[command(name = "imagesmith")]
#[command(about = "Load an image, transform it and export the result")]
#[command(
    after_help = "Steps run left to right, e.g.\n  imagesmith photo.jpg resize=800x600:cover rotate=15:#000 monochrome -o out/"
)]
pub struct Cli {
    /// JPEG, PNG or GIF file to load.
    pub input: PathBuf,

    /// Transform steps, applied in order.
    pub steps: Vec<Step>,

    /// Output file or directory. Defaults to overwriting the input.
    #[arg(short, long, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Write the encoded image to standard output.
    #[arg(long)]
    pub stdout: bool,

    /// Precede standard output with a Content-Type header block.
    #[arg(long, requires = "stdout")]
    pub header: bool,

    /// Output format. Defaults to the output extension, then the input format.
    #[arg(short, long)]
    pub format: Option<ImageFormat>,

    /// Encoding quality, 0 (smallest) to 100 (best).
    #[arg(short, long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: u8,

    /// Resampling filter for scale, resize and rotate.
    #[arg(long, default_value = "bilinear")]
    pub filter: FilterType,

    /// Apply the EXIF orientation of JPEG input.
    #[arg(long)]
    pub auto_orient: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Format to export with, given the format the input was loaded as.
    pub fn output_format(&self, source: Option<ImageFormat>) -> Option<ImageFormat> {
        self.format
            .or_else(|| {
                self.output
                    .as_ref()
                    .and_then(|path| path.extension())
                    .and_then(|ext| ext.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .or(source)
    }
}
