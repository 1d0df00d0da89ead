//! Image codecs and byte-level helpers, pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | magic-byte sniffing ([`identify`]) |
//! | **Decode** | `image::load_from_memory_with_format` (JPEG, PNG) |
//! | **Encode** | `JpegEncoder::new_with_quality`, PNG via `write_to` |
//! | **Aspect ratio** | [`estimate_ratio`] |
//!
//! The module is split into:
//! - **Format**: magic-byte identification (no I/O)
//! - **Decode**: sniffed decode for remote bytes, extension dispatch for local files
//! - **Encode**: persisting the merged canvas (used by the CLI)
//! - **Params**: [`Quality`] and [`OutputFormat`]
//! - **Ratio**: aspect-ratio estimation

pub mod decode;
pub mod encode;
pub mod format;
mod params;
mod ratio;

pub use decode::{decode_sniffed, probe_dimensions, read_image_file};
pub use encode::{EncodeError, encode_jpeg, encode_png, save_canvas};
pub use format::{ImageFormatTag, identify};
pub use params::{OutputFormat, Quality};
pub use ratio::{AspectRatio, RatioError, estimate_ratio};
