//! Resizing to target dimensions under a fit, cover or stretch policy.
//!
//! Layout is computed first as a pure [`ResizePlan`], then executed with the
//! shared resampler. Keeping the arithmetic separate from the pixels lets the
//! tie-break and centering rules be checked without decoding anything.
//!
//! # Policies
//!
//! Given a source `W x H` and a requested box `w x h`, two candidates are
//! considered: "scale to width" (`w x H*w/W`) and "scale to height"
//! (`W*h/H x h`). Which one wins is decided by comparing the box, stretched to
//! the source size on each axis, against the source:
//!
//! ```text
//! pretend_height = W * h / w
//! pretend_width  = H * w / h
//! ```
//!
//! - **fit** keeps the result inside the box: scale to width when
//!   `pretend_height > H`, else to height when `pretend_width > W`, else width.
//! - **cover** fills the box: scale to width when `pretend_width > W`, else to
//!   height when `pretend_height > H`, else width; then center-crop to `w x h`.
//! - **stretch** uses `w x h` verbatim.

use std::fmt;
use std::str::FromStr;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{check_pixel_count, output_dimensions, resample, FilterType, TransformError};
use crate::buffer::PixelBuffer;

/// How to reconcile a requested box with the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Fit entirely inside the box, preserving aspect ratio.
    #[default]
    Fit,
    /// Cover the whole box, preserving aspect ratio, then crop the overflow.
    Cover,
    /// Force the exact box, ignoring aspect ratio.
    Stretch,
}

impl FromStr for ResizePolicy {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Ok(ResizePolicy::Fit),
            "cover" => Ok(ResizePolicy::Cover),
            "stretch" => Ok(ResizePolicy::Stretch),
            other => Err(TransformError::InvalidDimensions(format!(
                "unknown resize policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for ResizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResizePolicy::Fit => "fit",
            ResizePolicy::Cover => "cover",
            ResizePolicy::Stretch => "stretch",
        })
    }
}

/// Target dimensions for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeSpec {
    /// New width; height follows the aspect ratio.
    Width(u32),
    /// New height; width follows the aspect ratio.
    Height(u32),
    /// A bounding box reconciled through `policy`.
    Bounded {
        width: u32,
        height: u32,
        policy: ResizePolicy,
    },
}

impl ResizeSpec {
    /// Collapse a box with one empty side into the single-dimension form and
    /// reject specs with nothing to resize to.
    fn normalized(self) -> Result<Self, TransformError> {
        let spec = match self {
            ResizeSpec::Bounded {
                width, height: 0, ..
            } => ResizeSpec::Width(width),
            ResizeSpec::Bounded {
                width: 0, height, ..
            } => ResizeSpec::Height(height),
            other => other,
        };
        match spec {
            ResizeSpec::Width(0) | ResizeSpec::Height(0) => Err(
                TransformError::InvalidDimensions("resize needs a non-zero dimension".to_string()),
            ),
            spec => Ok(spec),
        }
    }
}

impl FromStr for ResizeSpec {
    type Err = TransformError;

    /// Parse `W`, `xH`, `WxH` or `WxH:policy`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TransformError::InvalidDimensions(format!("invalid resize: {s:?}"));
        let parse_dim = |text: &str| -> Result<u32, TransformError> {
            if text.is_empty() {
                Ok(0)
            } else {
                text.trim().parse().map_err(|_| invalid())
            }
        };

        let (dims, policy) = match s.split_once(':') {
            Some((dims, policy)) => (dims, policy.parse()?),
            None => (s, ResizePolicy::default()),
        };

        match dims.split_once(['x', 'X']) {
            Some((w, h)) => Ok(ResizeSpec::Bounded {
                width: parse_dim(w)?,
                height: parse_dim(h)?,
                policy,
            }),
            None => Ok(ResizeSpec::Width(parse_dim(dims)?)),
        }
    }
}

/// Layout computed for a resize, before any pixels are touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Size the whole source is resampled to.
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Size of the buffer that is finally produced.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Top-left of the canvas within the scaled image (cover only).
    pub offset_x: u32,
    pub offset_y: u32,
}

impl ResizePlan {
    /// Whether the scaled image must be cropped onto a differently sized canvas.
    pub fn crops(&self) -> bool {
        (self.scaled_width, self.scaled_height) != (self.canvas_width, self.canvas_height)
            || self.offset_x != 0
            || self.offset_y != 0
    }
}

/// Compute the layout for resizing a `width` x `height` source to `spec`.
///
/// Outputs larger than [`MAX_PIXELS`](super::MAX_PIXELS) are rejected with
/// `InvalidDimensions` before anything is allocated.
pub fn plan_resize(width: u32, height: u32, spec: ResizeSpec) -> Result<ResizePlan, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDimensions(format!(
            "source is {width}x{height}"
        )));
    }

    let (src_w, src_h) = (width as f64, height as f64);
    let by_width = |w: f64| (w, src_h * w / src_w);
    let by_height = |h: f64| (src_w * h / src_h, h);

    let mut cover_box = None;
    let (new_w, new_h) = match spec.normalized()? {
        ResizeSpec::Width(w) => by_width(w as f64),
        ResizeSpec::Height(h) => by_height(h as f64),
        ResizeSpec::Bounded {
            width: box_w,
            height: box_h,
            policy,
        } => {
            let (w, h) = (box_w as f64, box_h as f64);
            let pretend_height = src_w * h / w;
            let pretend_width = src_h * w / h;

            match policy {
                ResizePolicy::Fit => {
                    if pretend_height > src_h {
                        by_width(w)
                    } else if pretend_width > src_w {
                        by_height(h)
                    } else {
                        by_width(w)
                    }
                }
                ResizePolicy::Cover => {
                    cover_box = Some((box_w, box_h));
                    if pretend_width > src_w {
                        by_width(w)
                    } else if pretend_height > src_h {
                        by_height(h)
                    } else {
                        by_width(w)
                    }
                }
                ResizePolicy::Stretch => (w, h),
            }
        }
    };

    // Always round up so no side ends smaller than intended.
    let (scaled_width, scaled_height) = output_dimensions(new_w, new_h)?;
    if let Some((canvas_width, canvas_height)) = cover_box {
        check_pixel_count(canvas_width, canvas_height)?;
    }

    Ok(match cover_box {
        Some((canvas_width, canvas_height)) => ResizePlan {
            scaled_width,
            scaled_height,
            canvas_width,
            canvas_height,
            offset_x: centered_offset(scaled_width, canvas_width),
            offset_y: centered_offset(scaled_height, canvas_height),
        },
        None => ResizePlan {
            scaled_width,
            scaled_height,
            canvas_width: scaled_width,
            canvas_height: scaled_height,
            offset_x: 0,
            offset_y: 0,
        },
    })
}

/// `ceil(|scaled - requested| / 2)`, computed independently per axis.
fn centered_offset(scaled: u32, requested: u32) -> u32 {
    (scaled.abs_diff(requested) as f64 / 2.0).ceil() as u32
}

/// Resize `buffer` according to `spec`.
///
/// Fit and stretch allocate exactly the scaled size. Cover allocates exactly
/// the requested box (opaque black) and copies the scaled image into it,
/// shifted by the centering offset, clipping whatever overflows.
pub fn resize(
    buffer: &PixelBuffer,
    spec: ResizeSpec,
    filter: FilterType,
) -> Result<PixelBuffer, TransformError> {
    let plan = plan_resize(buffer.width(), buffer.height(), spec)?;
    let scaled = resample(buffer, plan.scaled_width, plan.scaled_height, filter)?;

    if !plan.crops() {
        return Ok(scaled);
    }

    tracing::debug!(?plan, "cropping scaled image onto cover canvas");

    let scaled = scaled
        .into_rgba_image()
        .ok_or_else(|| TransformError::Failed("failed to create RgbaImage".to_string()))?;
    let mut canvas = RgbaImage::from_pixel(
        plan.canvas_width,
        plan.canvas_height,
        Rgba([0, 0, 0, 255]),
    );
    image::imageops::replace(
        &mut canvas,
        &scaled,
        -(plan.offset_x as i64),
        -(plan.offset_y as i64),
    );

    PixelBuffer::from_rgba_image(canvas).map_err(|e| TransformError::Failed(e.to_string()))
}


// ============================================================================
// Property-Based Tests
// ============================================================================
