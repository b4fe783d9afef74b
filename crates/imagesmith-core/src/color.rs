//! Color normalization.
//!
//! Turns the loose color inputs accepted across the API (hex strings,
//! `rgb()`/`rgba()` strings, RGB triples and the literal `transparent`) into a
//! canonical [`Color`].
//!
//! # Transparency domain
//!
//! Colors carry transparency on a 0-127 scale where 0 is fully opaque and 127
//! is fully transparent. Conversion to a standard 0-255 alpha happens only at
//! the pixel boundary, through [`transparency_to_alpha`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transparency value of a fully transparent color.
pub const MAX_TRANSPARENCY: u8 = 127;

/// Error returned when a color input cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// The input matched none of the accepted color syntaxes.
    #[error("Invalid color: {input:?}")]
    InvalidColor { input: String },
}

impl ColorError {
    fn invalid(input: &str) -> Self {
        ColorError::InvalidColor {
            input: input.to_string(),
        }
    }
}

/// A normalized color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Fully opaque RGB color.
    Opaque([u8; 3]),
    /// RGB color with a transparency in `0..=127`.
    Translucent { rgb: [u8; 3], transparency: u8 },
    /// The symbolic fully transparent color.
    Transparent,
}

impl Color {
    pub const WHITE: Color = Color::Opaque([255, 255, 255]);
    pub const BLACK: Color = Color::Opaque([0, 0, 0]);

    /// RGB channels of the color. `Transparent` reports black.
    pub fn rgb(&self) -> [u8; 3] {
        match *self {
            Color::Opaque(rgb) => rgb,
            Color::Translucent { rgb, .. } => rgb,
            Color::Transparent => [0, 0, 0],
        }
    }

    /// Transparency on the 0 (opaque) to 127 (transparent) scale.
    pub fn transparency(&self) -> u8 {
        match *self {
            Color::Opaque(_) => 0,
            Color::Translucent { transparency, .. } => transparency.min(MAX_TRANSPARENCY),
            Color::Transparent => MAX_TRANSPARENCY,
        }
    }

    /// Opacity in `0.0..=1.0`.
    pub fn opacity(&self) -> f32 {
        (MAX_TRANSPARENCY - self.transparency()) as f32 / MAX_TRANSPARENCY as f32
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Color::Transparent)
    }

    /// Convert to a straight-alpha RGBA8 pixel.
    pub fn to_rgba(&self) -> image::Rgba<u8> {
        let [r, g, b] = self.rgb();
        image::Rgba([r, g, b, transparency_to_alpha(self.transparency())])
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Color::Opaque(rgb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Opaque([r, g, b]) => write!(f, "#{r:02X}{g:02X}{b:02X}"),
            Color::Translucent {
                rgb: [r, g, b],
                transparency,
            } => write!(f, "#{r:02X}{g:02X}{b:02X}/{transparency}"),
            Color::Transparent => f.write_str("transparent"),
        }
    }
}

/// Convert a 0-127 transparency into a standard 0-255 alpha.
///
/// ```text
/// alpha = round(255 * (127 - t) / 127)
/// ```
#[inline]
pub fn transparency_to_alpha(transparency: u8) -> u8 {
    let opaque = (MAX_TRANSPARENCY - transparency.min(MAX_TRANSPARENCY)) as f32;
    (opaque * 255.0 / MAX_TRANSPARENCY as f32).round() as u8
}

/// A color as supplied by a caller, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    /// An RGB triple, taken as already valid.
    Rgb([u8; 3]),
    /// An already normalized color.
    Color(Color),
    /// Hex, `rgb()`, `rgba()` or `transparent` text.
    Text(String),
}

impl ColorInput {
    /// Normalize this input into a [`Color`].
    pub fn normalize(&self) -> Result<Color, ColorError> {
        match self {
            ColorInput::Rgb(rgb) => Ok(Color::Opaque(*rgb)),
            ColorInput::Color(color) => Ok(*color),
            ColorInput::Text(text) => normalize_color(text),
        }
    }
}

impl From<[u8; 3]> for ColorInput {
    fn from(rgb: [u8; 3]) -> Self {
        ColorInput::Rgb(rgb)
    }
}

impl From<Color> for ColorInput {
    fn from(color: Color) -> Self {
        ColorInput::Color(color)
    }
}

impl From<&str> for ColorInput {
    fn from(text: &str) -> Self {
        ColorInput::Text(text.to_string())
    }
}

impl From<String> for ColorInput {
    fn from(text: String) -> Self {
        ColorInput::Text(text)
    }
}

impl fmt::Display for ColorInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorInput::Rgb([r, g, b]) => write!(f, "[{r}, {g}, {b}]"),
            ColorInput::Color(color) => color.fmt(f),
            ColorInput::Text(text) => f.write_str(text),
        }
    }
}

/// Which parameter a substituted color stood in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorRole {
    MonochromeWhite,
    MonochromeBlack,
    Colorize,
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorRole::MonochromeWhite => "monochrome white",
            ColorRole::MonochromeBlack => "monochrome black",
            ColorRole::Colorize => "colorize",
        })
    }
}

/// Record of an invalid color that was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFallback {
    pub role: ColorRole,
    pub error: ColorError,
    pub substituted: Color,
}

impl fmt::Display for ColorFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}); using {}", self.role, self.error, self.substituted)
    }
}

/// Normalize `input`, substituting `default` when it cannot be parsed.
///
/// The substitution is reported both as a `tracing` warning and through the
/// returned [`ColorFallback`].
pub fn normalize_or_default(
    input: &ColorInput,
    default: Color,
    role: ColorRole,
) -> (Color, Option<ColorFallback>) {
    match input.normalize() {
        Ok(color) => (color, None),
        Err(error) => {
            tracing::warn!(%role, %error, substituted = %default, "color could not be determined");
            (
                default,
                Some(ColorFallback {
                    role,
                    error,
                    substituted: default,
                }),
            )
        }
    }
}

/// Normalize a textual color.
///
/// Accepted forms:
/// - `transparent` (any case)
/// - `rgba(r, g, b, opacity)` with opacity in `0.0..=1.0`
/// - `rgb(r, g, b)`; anything before `rgb(` and after the first `)` is ignored
/// - `#RGB`, `#RRGGBB`, with or without the `#`
///
/// For the `rgb()` form every character that is not a hex digit or a comma is
/// discarded. Three all-decimal tokens are read as decimal channels; anything
/// else falls back to hex parsing of the first token.
pub fn normalize_color(input: &str) -> Result<Color, ColorError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("transparent") {
        return Ok(Color::Transparent);
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("rgba(") {
        return parse_rgba(trimmed).ok_or_else(|| ColorError::invalid(input));
    }

    let mut body = trimmed;
    if let Some(start) = lower.find("rgb(") {
        body = &body[start + "rgb(".len()..];
    }
    if let Some(end) = body.find(')') {
        body = &body[..end];
    }

    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_hexdigit() || *c == ',')
        .collect();
    let tokens: Vec<&str> = cleaned.split(',').collect();

    if tokens.len() == 3 && tokens.iter().all(|t| is_decimal(t)) {
        let mut rgb = [0u8; 3];
        for (channel, token) in rgb.iter_mut().zip(&tokens) {
            *channel = token.parse().map_err(|_| ColorError::invalid(input))?;
        }
        return Ok(Color::Opaque(rgb));
    }

    hex_to_rgb(tokens[0])
        .map(Color::Opaque)
        .ok_or_else(|| ColorError::invalid(input))
}

/// Parse a 3- or 6-digit hex color, with or without a leading `#`.
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return None;
    }

    let pairs: [String; 3] = match hex.len() {
        3 => {
            let b = hex.as_bytes();
            [0, 1, 2].map(|i| {
                let digit = b[i] as char;
                format!("{digit}{digit}")
            })
        }
        6 => [0, 2, 4].map(|i| hex[i..i + 2].to_string()),
        _ => return None,
    };

    let mut rgb = [0u8; 3];
    for (channel, pair) in rgb.iter_mut().zip(&pairs) {
        *channel = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(rgb)
}

fn is_decimal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_rgba(text: &str) -> Option<Color> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close <= open {
        return None;
    }

    let parts: Vec<&str> = text[open + 1..close].split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return None;
    }

    let mut rgb = [0u8; 3];
    for (channel, part) in rgb.iter_mut().zip(&parts[..3]) {
        *channel = part.parse().ok()?;
    }

    let opacity: f32 = parts[3].parse().ok()?;
    if !(0.0..=1.0).contains(&opacity) {
        return None;
    }

    let transparency = (MAX_TRANSPARENCY as f32 * (1.0 - opacity)).round() as u8;
    Some(match transparency {
        0 => Color::Opaque(rgb),
        MAX_TRANSPARENCY => Color::Transparent,
        transparency => Color::Translucent { rgb, transparency },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex() {
        assert_eq!(normalize_color("#0F0"), Ok(Color::Opaque([0, 255, 0])));
        assert_eq!(normalize_color("fff"), Ok(Color::WHITE));
    }

    #[test]
    fn test_long_hex() {
        assert_eq!(normalize_color("1A2B3C"), Ok(Color::Opaque([26, 43, 60])));
        assert_eq!(normalize_color("#1a2b3c"), Ok(Color::Opaque([26, 43, 60])));
    }

    #[test]
    fn test_bad_hex_length() {
        assert!(normalize_color("#1234").is_err());
        assert!(normalize_color("").is_err());
        assert!(normalize_color("#").is_err());
    }

    #[test]
    fn test_rgb_string() {
        assert_eq!(
            normalize_color("rgb(10, 20, 30)"),
            Ok(Color::Opaque([10, 20, 30]))
        );
        assert_eq!(
            normalize_color("color: rgb(255,0,128);"),
            Ok(Color::Opaque([255, 0, 128]))
        );
    }

    #[test]
    fn test_rgb_out_of_range() {
        assert!(normalize_color("rgb(300, 0, 0)").is_err());
    }

    #[test]
    fn test_rgb_with_hex_letters_falls_back_to_hex() {
        // "abc,1,2" is not three decimals, so the first token is read as hex
        assert_eq!(
            normalize_color("rgb(abc, 1, 2)"),
            Ok(Color::Opaque([0xAA, 0xBB, 0xCC]))
        );
    }

    #[test]
    fn test_two_tokens_is_invalid() {
        assert!(normalize_color("rgb(1, 2)").is_err());
    }

    #[test]
    fn test_transparent() {
        assert_eq!(normalize_color("transparent"), Ok(Color::Transparent));
        assert_eq!(normalize_color("  Transparent "), Ok(Color::Transparent));
    }

    #[test]
    fn test_rgba_string() {
        assert_eq!(
            normalize_color("rgba(10, 20, 30, 1)"),
            Ok(Color::Opaque([10, 20, 30]))
        );
        assert_eq!(normalize_color("rgba(10, 20, 30, 0)"), Ok(Color::Transparent));
        assert_eq!(
            normalize_color("rgba(10, 20, 30, 0.5)"),
            Ok(Color::Translucent {
                rgb: [10, 20, 30],
                transparency: 64
            })
        );
        assert!(normalize_color("rgba(10, 20, 30, 2)").is_err());
        assert!(normalize_color("rgba(10, 20, 30)").is_err());
    }

    #[test]
    fn test_triple_passthrough() {
        let input = ColorInput::from([1, 2, 3]);
        assert_eq!(input.normalize(), Ok(Color::Opaque([1, 2, 3])));
    }

    #[test]
    fn test_transparency_to_alpha() {
        assert_eq!(transparency_to_alpha(0), 255);
        assert_eq!(transparency_to_alpha(127), 0);
        assert_eq!(transparency_to_alpha(200), 0);
        assert_eq!(transparency_to_alpha(64), 126);
    }

    #[test]
    fn test_color_to_rgba() {
        assert_eq!(Color::WHITE.to_rgba(), image::Rgba([255, 255, 255, 255]));
        assert_eq!(Color::Transparent.to_rgba(), image::Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_normalize_or_default_substitutes() {
        let input = ColorInput::from("not a color");
        let (color, fallback) =
            normalize_or_default(&input, Color::BLACK, ColorRole::MonochromeBlack);
        assert_eq!(color, Color::BLACK);
        let fallback = fallback.unwrap();
        assert_eq!(fallback.role, ColorRole::MonochromeBlack);
        assert_eq!(fallback.substituted, Color::BLACK);
    }

    #[test]
    fn test_normalize_or_default_passes_valid() {
        let input = ColorInput::from("#123456");
        let (color, fallback) =
            normalize_or_default(&input, Color::WHITE, ColorRole::MonochromeWhite);
        assert_eq!(color, Color::Opaque([0x12, 0x34, 0x56]));
        assert!(fallback.is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::Opaque([255, 0, 16]).to_string(), "#FF0010");
        assert_eq!(Color::Transparent.to_string(), "transparent");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
