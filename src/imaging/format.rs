//! Container format identification by magic bytes.
//!
//! Pure functions over a byte prefix, no I/O. Signatures are checked in a
//! fixed precedence order: BMP, JPEG, GIF, PNG, WebP.
//!
//! | Format | Signature | Offset | Minimum length |
//! |---|---|---|---|
//! | BMP | `42 4D` | 0 | 2 |
//! | JPEG | `FF D8 FF` | 0 | 4 |
//! | GIF | `47 49 46 38` | 0 | 4 |
//! | PNG | `89 50 4E 47` | 0 | 4 |
//! | WebP | `57 45 42 50` | 8 | 12 |

use serde::Serialize;
use std::fmt;

/// Image container format detected from the leading bytes of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatTag {
    Bmp,
    Jpeg,
    Gif,
    Png,
    WebP,
    Unknown,
}

impl ImageFormatTag {
    /// File extension for the format, including the leading dot.
    /// Empty for [`ImageFormatTag::Unknown`].
    pub fn ext(self) -> &'static str {
        match self {
            ImageFormatTag::Bmp => ".bmp",
            ImageFormatTag::Jpeg => ".jpg",
            ImageFormatTag::Gif => ".gif",
            ImageFormatTag::Png => ".png",
            ImageFormatTag::WebP => ".webp",
            ImageFormatTag::Unknown => "",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ImageFormatTag::Bmp => "bmp",
            ImageFormatTag::Jpeg => "jpeg",
            ImageFormatTag::Gif => "gif",
            ImageFormatTag::Png => "png",
            ImageFormatTag::WebP => "webp",
            ImageFormatTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identify the container format of `data`.
pub fn identify(data: &[u8]) -> ImageFormatTag {
    if is_bmp(data) {
        ImageFormatTag::Bmp
    } else if is_jpeg(data) {
        ImageFormatTag::Jpeg
    } else if is_gif(data) {
        ImageFormatTag::Gif
    } else if is_png(data) {
        ImageFormatTag::Png
    } else if is_webp(data) {
        ImageFormatTag::WebP
    } else {
        ImageFormatTag::Unknown
    }
}

pub fn is_bmp(data: &[u8]) -> bool {
    data.len() >= 2 && data.starts_with(&[0x42, 0x4d])
}

/// The JPEG signature is three bytes but, like the other leading-signature
/// checks, needs at least four bytes of input.
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 4 && data.starts_with(&[0xff, 0xd8, 0xff])
}

pub fn is_gif(data: &[u8]) -> bool {
    data.len() >= 4 && data.starts_with(&[0x47, 0x49, 0x46, 0x38])
}

pub fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data.starts_with(&[0x89, 0x50, 0x4e, 0x47])
}

/// `WEBP` fourcc inside a RIFF header.
pub fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && data[8..12] == [0x57, 0x45, 0x42, 0x50]
}
