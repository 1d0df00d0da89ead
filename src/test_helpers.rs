//! Shared test utilities for the gridmerge test suite.
//!
//! Builds small solid-color fixtures in memory or on disk so tests never depend
//! on checked-in binary images.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_solid_png(&tmp.path().join("red.png"), 10, 10, Rgba([255, 0, 0, 255]));
//! let bytes = encode_solid_jpeg(8, 8, [0, 128, 0]);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// In-memory fixtures
// =========================================================================

/// PNG bytes of a `w × h` image filled with `color`.
pub fn encode_solid_png(w: u32, h: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, color);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// JPEG bytes of a `w × h` image filled with `rgb`.
pub fn encode_solid_jpeg(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(w, h, Rgb(rgb));
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&img)
        .unwrap();
    buf
}

// =========================================================================
// On-disk fixtures
// =========================================================================

/// Write a solid-color PNG to `path`. Panics on I/O failure.
pub fn write_solid_png(path: &Path, w: u32, h: u32, color: Rgba<u8>) {
    std::fs::write(path, encode_solid_png(w, h, color))
        .unwrap_or_else(|e| panic!("failed to write fixture {}: {e}", path.display()));
}
