//! Persisting a merged canvas.
//!
//! Lives outside the merge core: [`merge`](crate::MergeJob::merge) hands back
//! an in-memory [`RgbaImage`] and callers decide how to store it. The CLI uses
//! [`save_canvas`], which picks JPEG or PNG from the output extension.

use super::params::{OutputFormat, Quality};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unsupported output extension for {}, expected .jpg, .jpeg or .png", .0.display())]
    UnsupportedExtension(PathBuf),
}

/// Encode as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(canvas: &RgbaImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    let rgb: RgbImage = canvas.convert();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value()).encode_image(&rgb)?;
    Ok(buf)
}

pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Write `canvas` to `path`, creating parent directories as needed.
///
/// `quality` only applies to JPEG output.
pub fn save_canvas(canvas: &RgbaImage, path: &Path, quality: Quality) -> Result<(), EncodeError> {
    let bytes = match OutputFormat::from_path(path) {
        Some(OutputFormat::Jpeg) => encode_jpeg(canvas, quality)?,
        Some(OutputFormat::Png) => encode_png(canvas)?,
        None => return Err(EncodeError::UnsupportedExtension(path.to_path_buf())),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
