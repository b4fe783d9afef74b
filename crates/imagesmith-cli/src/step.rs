//! Transform steps given on the command line.
//!
//! A step is `name`, `name=argument` or `name:argument`. Arguments with more
//! than one part separate them with `:` (`rotate=30:#000`, `pixelate=8:simple`).

use std::str::FromStr;

use imagesmith_core::{FlipAxis, ImageSession, ResizeSpec, ScaleFactor, SessionError};

/// Background used by rotations when none is given.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

const DEFAULT_WHITE: &str = "#FFFFFF";
const DEFAULT_BLACK: &str = "#000000";
const DEFAULT_COLORIZE: &str = "#FFF";

/// One transform applied to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Scale(ScaleFactor),
    Resize(ResizeSpec),
    Rotate { angle: f64, background: String },
    RotateClockwise { angle: f64, background: String },
    RotateCounterclockwise { angle: f64, background: String },
    RotateRight { background: String },
    RotateLeft { background: String },
    Flip(FlipAxis),
    Grayscale,
    Monochrome { white: String, black: String },
    Negative,
    Brightness(i32),
    Contrast(i32),
    Colorize(String),
    EdgeDetect,
    Emboss,
    Blur(u32),
    SelectiveBlur(u32),
    RemoveMean,
    Smooth(f32),
    Pixelate { block: u32, advanced: bool },
}

impl Step {
    /// Run this step against `session`.
    ///
    /// Color substitutions are logged by the core as they happen.
    pub fn apply(&self, session: &mut ImageSession) -> Result<(), SessionError> {
        match self {
            Step::Scale(factor) => session.scale(*factor).map(drop),
            Step::Resize(spec) => session.resize(*spec).map(drop),
            Step::Rotate { angle, background } => {
                session.rotate(*angle, background.as_str()).map(drop)
            }
            Step::RotateClockwise { angle, background } => {
                session.rotate_clockwise(*angle, background.as_str()).map(drop)
            }
            Step::RotateCounterclockwise { angle, background } => session
                .rotate_counterclockwise(*angle, background.as_str())
                .map(drop),
            Step::RotateRight { background } => session.rotate_right(background.as_str()).map(drop),
            Step::RotateLeft { background } => session.rotate_left(background.as_str()).map(drop),
            Step::Flip(axis) => session.flip(*axis).map(drop),
            Step::Grayscale => session.grayscale(),
            Step::Monochrome { white, black } => {
                session.monochrome(white.as_str(), black.as_str()).map(drop)
            }
            Step::Negative => session.negative(),
            Step::Brightness(amount) => session.brightness(*amount),
            Step::Contrast(amount) => session.contrast(*amount),
            Step::Colorize(color) => session.colorize(color.as_str()).map(drop),
            Step::EdgeDetect => session.edge_detect(),
            Step::Emboss => session.emboss(),
            Step::Blur(passes) => session.blur(*passes),
            Step::SelectiveBlur(passes) => session.selective_blur(*passes),
            Step::RemoveMean => session.remove_mean(),
            Step::Smooth(weight) => session.smooth(*weight),
            Step::Pixelate { block, advanced } => session.pixelate(*block, *advanced),
        }
    }
}

fn parse_number<T: FromStr>(name: &str, text: &str) -> Result<T, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("{name}: {text:?} is not a valid number"))
}

fn required<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str, String> {
    arg.filter(|a| !a.is_empty())
        .ok_or_else(|| format!("{name} needs an argument"))
}

/// Split `DEG[:COLOR]`.
fn angle_and_background(name: &str, arg: Option<&str>) -> Result<(f64, String), String> {
    let arg = required(name, arg)?;
    let (angle, background) = match arg.split_once(':') {
        Some((angle, background)) => (angle, background),
        None => (arg, DEFAULT_BACKGROUND),
    };
    Ok((parse_number(name, angle)?, background.to_string()))
}

fn background(arg: Option<&str>) -> String {
    arg.filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_BACKGROUND)
        .to_string()
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once('=').or_else(|| s.split_once(':')) {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let name = name.to_ascii_lowercase();

        let step = match name.as_str() {
            "scale" => Step::Scale(
                required(&name, arg)?
                    .parse()
                    .map_err(|e| format!("scale: {e}"))?,
            ),
            "resize" => Step::Resize(
                required(&name, arg)?
                    .parse()
                    .map_err(|e| format!("resize: {e}"))?,
            ),
            "rotate" | "rotate-ccw" => {
                let (angle, background) = angle_and_background(&name, arg)?;
                if name == "rotate" {
                    Step::Rotate { angle, background }
                } else {
                    Step::RotateCounterclockwise { angle, background }
                }
            }
            "rotate-cw" => {
                let (angle, background) = angle_and_background(&name, arg)?;
                Step::RotateClockwise { angle, background }
            }
            "rotate-right" => Step::RotateRight {
                background: background(arg),
            },
            "rotate-left" => Step::RotateLeft {
                background: background(arg),
            },
            "flip" => Step::Flip(match arg {
                Some(axis) => axis.parse().unwrap_or_default(),
                None => FlipAxis::Both,
            }),
            "grayscale" | "greyscale" => Step::Grayscale,
            "monochrome" => {
                let (white, black) = match arg.filter(|a| !a.is_empty()) {
                    Some(arg) => match arg.split_once(':') {
                        Some((white, black)) => (white, black),
                        None => (arg, DEFAULT_BLACK),
                    },
                    None => (DEFAULT_WHITE, DEFAULT_BLACK),
                };
                Step::Monochrome {
                    white: white.to_string(),
                    black: black.to_string(),
                }
            }
            "negative" | "negate" => Step::Negative,
            "brightness" => Step::Brightness(parse_number(&name, required(&name, arg)?)?),
            "contrast" => Step::Contrast(parse_number(&name, required(&name, arg)?)?),
            "colorize" => Step::Colorize(
                arg.filter(|a| !a.is_empty())
                    .unwrap_or(DEFAULT_COLORIZE)
                    .to_string(),
            ),
            "edge-detect" => Step::EdgeDetect,
            "emboss" => Step::Emboss,
            "blur" => Step::Blur(arg.map_or(Ok(1), |a| parse_number(&name, a))?),
            "selective-blur" => Step::SelectiveBlur(arg.map_or(Ok(1), |a| parse_number(&name, a))?),
            "remove-mean" => Step::RemoveMean,
            "smooth" => Step::Smooth(parse_number(&name, required(&name, arg)?)?),
            "pixelate" => {
                let arg = required(&name, arg)?;
                let (block, mode) = match arg.split_once(':') {
                    Some((block, mode)) => (block, Some(mode)),
                    None => (arg, None),
                };
                let advanced = match mode.map(str::to_ascii_lowercase).as_deref() {
                    None | Some("advanced") => true,
                    Some("simple") => false,
                    Some(other) => return Err(format!("pixelate: unknown mode {other:?}")),
                };
                Step::Pixelate {
                    block: parse_number(&name, block)?,
                    advanced,
                }
            }
            other => return Err(format!("unknown step {other:?}")),
        };
        Ok(step)
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
        /// Property: any integer brightness parses back to itself.
        #[test]
        fn prop_brightness_parses(amount in -1000i32..=1000) {
            prop_assert_eq!(
                format!("brightness={amount}").parse::<Step>(),
                Ok(Step::Brightness(amount))
            );
        }

        /// Property: parsing never panics on arbitrary input.
        #[test]
        fn prop_never_panics(text in ".{0,32}") {
            let _ = text.parse::<Step>();
        }
    }
}
