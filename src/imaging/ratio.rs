//! Aspect-ratio classification.
//!
//! Pure functions, no I/O. Maps pixel dimensions onto the handful of ratios
//! the `identify` command reports.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Tolerance on `long / short` when matching 4:3 and 16:9.
const RATIO_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait9x16 => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RatioError {
    #[error("unsupported aspect ratio for {width}x{height}")]
    Unsupported { width: u32, height: u32 },
}

/// Estimate the aspect ratio of a `width × height` image.
///
/// Dimensions within 2px of each other count as square. Otherwise the
/// long/short ratio is compared against 4:3, then 16:9.
///
/// ```
/// # use gridmerge::imaging::{AspectRatio, estimate_ratio};
/// assert_eq!(estimate_ratio(800, 600), Ok(AspectRatio::Landscape4x3));
/// assert_eq!(estimate_ratio(1080, 1920), Ok(AspectRatio::Portrait9x16));
/// ```
pub fn estimate_ratio(width: u32, height: u32) -> Result<AspectRatio, RatioError> {
    if width.abs_diff(height) < 2 {
        return Ok(AspectRatio::Square);
    }

    let (w, h) = (width as f64, height as f64);
    let landscape = width > height;
    let ratio = if landscape { w / h } else { h / w };

    if (ratio - 4.0 / 3.0).abs() <= RATIO_TOLERANCE {
        return Ok(if landscape {
            AspectRatio::Landscape4x3
        } else {
            AspectRatio::Portrait3x4
        });
    }
    if (ratio - 16.0 / 9.0).abs() <= RATIO_TOLERANCE {
        return Ok(if landscape {
            AspectRatio::Landscape16x9
        } else {
            AspectRatio::Portrait9x16
        });
    }
    Err(RatioError::Unsupported { width, height })
}
