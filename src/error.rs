//! Failure taxonomy for a merge call.
//!
//! Every variant is fatal to the enclosing [`MergeJob::merge`](crate::MergeJob::merge):
//! there are no partial canvases and no skipped cells. Each variant carries
//! enough context (source, status, cause) to diagnose a failure without
//! re-running the job.

use crate::imaging::ImageFormatTag;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Boxed cause of a transport failure, as reported by a [`Transport`](crate::resolve::Transport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("failed to download image {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("remote images not fetched within {0:?}")]
    Timeout(Duration),
    #[error("failed to download image {url}: status code {status} != 2xx, {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode {format} image {source_id}: {cause}")]
    Decode {
        source_id: String,
        format: &'static str,
        #[source]
        cause: image::ImageError,
    },
    #[error("unsupported format of image {source_id} (detected {detected}), expected .png or .jpeg")]
    UnsupportedFormat {
        source_id: String,
        detected: ImageFormatTag,
    },
    #[error("failed to read image file {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("there is no image to merge")]
    EmptyInput,
    #[error("sizing image index {index} out of range for {len} resolved images")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("grid must have at least one column and one row, got {columns}x{rows}")]
    InvalidGrid { columns: u32, rows: u32 },
    #[error("canvas of {columns}x{rows} cells at {cell_width}x{cell_height}px exceeds u32 pixel bounds")]
    CanvasTooLarge {
        columns: u32,
        rows: u32,
        cell_width: u32,
        cell_height: u32,
    },
    #[error("failed to start fetch runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("blocking merge called from inside an async runtime, use merge_async")]
    InsideRuntime,
}

impl MergeError {
    /// HTTP status code, for [`MergeError::HttpStatus`] failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            MergeError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
