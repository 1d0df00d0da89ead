//! # gridmerge
//!
//! Composite a set of images into one grid image. Sources are local files,
//! remote `http(s)` URLs, or rasters already in memory. Each source lands in
//! one cell of a `columns × rows` grid; a cell can have a background color and
//! a list of overlay images drawn at pixel offsets from its origin.
//!
//! # Pipeline
//!
//! ```text
//! MergeJob ──▶ resolve ──▶ Vec<Raster> ──▶ composite ──▶ RgbaImage
//!              (local: sequential,          (cell size, cells,
//!               remote: concurrent,          overlays)
//!               shared deadline)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`grid`] | `GridDescriptor`, `Overlay`, `SizingPolicy`, `MergeJob` and its builder |
//! | [`resolve`] | Turns cells into rasters: sequential disk reads or concurrent HTTP fetches |
//! | [`layout`] | Cell sizing, row-major placement, base draw and overlay draw |
//! | [`merge`] | `MergeJob::merge`, the entry point tying resolve and layout together |
//! | [`error`] | `MergeError`, the failure taxonomy of a merge call |
//! | [`imaging`] | Magic-byte sniffing, decoding, encoding, aspect-ratio estimate |
//! | [`config`] | TOML job files for the `gridmerge` CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Dispatch Rules
//!
//! Remote bytes are decoded by sniffing their magic bytes. Local files are
//! decoded by their extension: `.jpg`/`.jpeg` is JPEG, anything else is PNG.
//! A local file whose name disagrees with its content fails to decode rather
//! than being silently re-sniffed.
//!
//! ## All or Nothing
//!
//! Any failure (network, status, decode, missing file, bad sizing index) ends
//! the merge. There is no partial canvas and no retry; callers wanting retries
//! wrap `merge`.
//!
//! ## No Scaling
//!
//! Cells share one size. Images larger than a cell are clipped at the cell
//! edge; smaller ones leave the remainder untouched.

pub mod config;
pub mod error;
pub mod grid;
pub mod imaging;
pub mod layout;
pub mod merge;
pub mod output;
pub mod resolve;

pub use error::MergeError;
pub use grid::{GridDescriptor, MergeJob, Overlay, SizingPolicy};
pub use resolve::{HttpTransport, Transport};

#[cfg(test)]
pub(crate) mod test_helpers;
