//! Raster decoding for the two acquisition paths.
//!
//! Remote bytes are dispatched on their sniffed content; local files are
//! dispatched on their path extension. The two rules disagree for a file whose
//! name lies about its content (a `.png` holding JPEG bytes fails as PNG).
//! That mismatch is kept as-is.
//!
//! | Path | Dispatch | Decoders |
//! |---|---|---|
//! | Remote | [`identify`](super::format::identify) | JPEG, PNG; anything else is unsupported |
//! | Local | text after the last `.` | `jpg`/`jpeg` → JPEG, everything else → PNG |

use super::format::{ImageFormatTag, identify};
use crate::error::MergeError;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Decode bytes fetched from `url`, choosing the decoder from the magic bytes.
pub fn decode_sniffed(url: &str, bytes: &[u8]) -> Result<RgbaImage, MergeError> {
    match identify(bytes) {
        ImageFormatTag::Png => decode_as(url, bytes, ImageFormat::Png),
        ImageFormatTag::Jpeg => decode_as(url, bytes, ImageFormat::Jpeg),
        detected => Err(MergeError::UnsupportedFormat {
            source_id: url.to_string(),
            detected,
        }),
    }
}

/// Decoder chosen for a local path: JPEG for a `jpg`/`jpeg` suffix, PNG otherwise.
pub fn format_for_path(path: &str) -> ImageFormat {
    // Last `.`-separated segment of the whole string, so a dotted directory
    // name with an extensionless file still resolves to that segment.
    match path.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => ImageFormat::Jpeg,
        _ => ImageFormat::Png,
    }
}

/// Read and decode a local image file.
///
/// `path` is made absolute against the current directory before opening.
pub fn read_image_file(path: &Path) -> Result<RgbaImage, MergeError> {
    let abs = absolute(path)?;
    let bytes = std::fs::read(&abs).map_err(|source| MergeError::Filesystem {
        path: abs.clone(),
        source,
    })?;
    let format = format_for_path(&path.to_string_lossy());
    decode_as(&abs.to_string_lossy(), &bytes, format)
}

/// Pixel dimensions from the image header, without decoding pixel data.
///
/// `None` for formats this build cannot decode.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn absolute(path: &Path) -> Result<PathBuf, MergeError> {
    std::path::absolute(path).map_err(|source| MergeError::Filesystem {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_as(source_id: &str, bytes: &[u8], format: ImageFormat) -> Result<RgbaImage, MergeError> {
    image::load_from_memory_with_format(bytes, format)
        .map(|img| img.to_rgba8())
        .map_err(|cause| MergeError::Decode {
            source_id: source_id.to_string(),
            format: format_name(format),
            cause,
        })
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        _ => "png",
    }
}
