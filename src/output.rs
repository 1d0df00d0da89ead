//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (a grid cell, an identified file) leads with its positional
//! index and identity, with details shown as indented context lines. The
//! output reads as an inventory of what went into the canvas.
//!
//! # Output Format
//!
//! ## Merge
//!
//! ```text
//! 2x2 grid, 20x20 px
//! 001 red.png
//!     Background: #00ff00ff
//!     Overlay: badge.png at (5, 5)
//! 002 https://example.com/b.jpg
//! 003 (in memory)
//! 004 (empty)
//! Wrote merged.jpg
//! ```
//!
//! ## Identify
//!
//! ```text
//! 001 photo.jpg
//!     Format: jpeg
//!     Size: 800x600
//!     Ratio: 4:3
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure, no I/O.

use crate::grid::{GridDescriptor, MergeJob};
use crate::imaging::{AspectRatio, ImageFormatTag, estimate_ratio, identify, probe_dimensions};
use image::Rgba;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn format_color(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
}

/// Header line for one cell: index plus where its image comes from.
fn cell_header(index: usize, cell: &GridDescriptor) -> String {
    let label = match (&cell.image, cell.source.is_empty()) {
        (Some(_), _) => "(in memory)".to_string(),
        (None, true) => "(no source)".to_string(),
        (None, false) => cell.source.clone(),
    };
    format!("{} {}", format_index(index), label)
}

// ============================================================================
// Merge output
// ============================================================================

/// Format the summary of a finished merge.
///
/// One entry per grid slot. Descriptors past `columns × rows` are listed as
/// clipped, missing ones as empty.
pub fn format_merge_summary(
    job: &MergeJob,
    canvas_size: (u32, u32),
    written_to: Option<&Path>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{}x{} grid, {}x{} px",
        job.columns, job.rows, canvas_size.0, canvas_size.1
    )];
    let capacity = job.columns as usize * job.rows as usize;

    for (i, cell) in job.grids.iter().enumerate() {
        let mut header = cell_header(i + 1, cell);
        if i >= capacity {
            header.push_str(" (clipped)");
        }
        lines.push(header);
        if let Some(bg) = cell.background {
            lines.push(format!("    Background: {}", format_color(bg)));
        }
        for overlay in &cell.overlays {
            let name = if overlay.image.is_some() {
                "(in memory)"
            } else {
                overlay.path.as_str()
            };
            lines.push(format!(
                "    Overlay: {} at ({}, {})",
                name, overlay.offset_x, overlay.offset_y
            ));
        }
    }
    for i in job.grids.len()..capacity {
        lines.push(format!("{} (empty)", format_index(i + 1)));
    }

    if let Some(path) = written_to {
        lines.push(format!("Wrote {}", path.display()));
    }
    lines
}

/// Print merge summary to stdout.
pub fn print_merge_summary(job: &MergeJob, canvas_size: (u32, u32), written_to: Option<&Path>) {
    for line in format_merge_summary(job, canvas_size, written_to) {
        println!("{}", line);
    }
}

// ============================================================================
// Identify output
// ============================================================================

/// What `identify` found out about one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifyReport {
    pub path: String,
    pub format: ImageFormatTag,
    /// `None` when this build cannot read the format's header.
    pub dimensions: Option<(u32, u32)>,
    /// `None` when dimensions are unknown or match no supported ratio.
    pub ratio: Option<AspectRatio>,
}

impl IdentifyReport {
    pub fn from_bytes(path: &str, bytes: &[u8]) -> Self {
        let dimensions = probe_dimensions(bytes);
        Self {
            path: path.to_string(),
            format: identify(bytes),
            dimensions,
            ratio: dimensions.and_then(|(w, h)| estimate_ratio(w, h).ok()),
        }
    }
}

/// Format identify results, one entry per file.
pub fn format_identify(reports: &[IdentifyReport]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, report) in reports.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), report.path));
        lines.push(format!("    Format: {}", report.format));
        match report.dimensions {
            Some((w, h)) => lines.push(format!("    Size: {}x{}", w, h)),
            None => lines.push("    Size: unknown".to_string()),
        }
        match report.ratio {
            Some(ratio) => lines.push(format!("    Ratio: {}", ratio)),
            None if report.dimensions.is_some() => {
                lines.push("    Ratio: unsupported".to_string())
            }
            None => {}
        }
    }
    lines
}

/// Print identify results to stdout.
pub fn print_identify(reports: &[IdentifyReport]) {
    for line in format_identify(reports) {
        println!("{}", line);
    }
}
