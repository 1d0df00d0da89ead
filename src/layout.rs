//! Layout engine: cell sizing, cell placement, and compositing.
//!
//! ## Algorithm
//!
//! ```text
//! 1. cell size   ← SizingPolicy over the resolved rasters (once, not per cell)
//! 2. canvas      ← zeroed RGBA, (columns × cell_w) by (rows × cell_h)
//! 3. cell i      → column i % columns, row i / columns (row-major)
//!      background? fill cell, then alpha-over the raster
//!      otherwise   copy the raster straight in (no blending)
//! 4. overlays    → alpha-over at the cell origin + (offset_x, offset_y)
//! ```
//!
//! Rasters are clipped to the cell size, never scaled. A raster smaller than
//! its cell leaves the rest of the cell as it was (transparent black unless a
//! background was filled). Anything falling outside the canvas is dropped by
//! the blit's own clipping.
//!
//! Output is bit-identical for identical inputs.

use crate::error::MergeError;
use crate::grid::{GridDescriptor, MergeJob, SizingPolicy};
use crate::resolve::{Raster, load_local};
use image::{Rgba, RgbaImage, imageops};
use std::borrow::Cow;
use tracing::debug;

/// Pixel size shared by every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// A cell's placement on the canvas. `x`/`y` may lie outside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    /// The same rectangle moved by `(dx, dy)`, saturating at the `i64` bounds.
    pub fn translate(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self
        }
    }
}

/// Resolve the sizing policy against the full list of resolved rasters.
pub fn cell_size(policy: SizingPolicy, images: &[Raster<'_>]) -> Result<CellSize, MergeError> {
    let from_image = |index: usize| {
        images
            .get(index)
            .map(|img| CellSize {
                width: img.width(),
                height: img.height(),
            })
            .ok_or(MergeError::IndexOutOfRange {
                index,
                len: images.len(),
            })
    };

    match policy {
        SizingPolicy::FixedSize { width, height } if width != 0 && height != 0 => {
            Ok(CellSize { width, height })
        }
        SizingPolicy::FromNthImage(index) => from_image(index),
        SizingPolicy::Default | SizingPolicy::FixedSize { .. } => {
            if images.is_empty() {
                return Err(MergeError::EmptyInput);
            }
            from_image(0)
        }
    }
}

/// Rectangle of cell `index` in a grid `columns` wide (row-major).
pub fn cell_rect(index: usize, columns: u32, cell: CellSize) -> CellRect {
    let columns = columns.max(1) as usize;
    let col = (index % columns) as i64;
    let row = (index / columns) as i64;
    CellRect {
        x: col * cell.width as i64,
        y: row * cell.height as i64,
        width: cell.width,
        height: cell.height,
    }
}

/// Allocate the zeroed canvas for a `columns × rows` grid of `cell`-sized cells.
pub fn new_canvas(columns: u32, rows: u32, cell: CellSize) -> Result<RgbaImage, MergeError> {
    let too_large = || MergeError::CanvasTooLarge {
        columns,
        rows,
        cell_width: cell.width,
        cell_height: cell.height,
    };
    let width = columns.checked_mul(cell.width).ok_or_else(too_large)?;
    let height = rows.checked_mul(cell.height).ok_or_else(too_large)?;
    // RGBA buffer length must also fit in usize.
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(too_large)?;
    Ok(RgbaImage::new(width, height))
}

/// Composite resolved rasters onto a fresh canvas.
///
/// `images[i]` is drawn into the cell of `job.grids[i]`. Overlay rasters are
/// loaded here, from local paths, whatever mode the cells were resolved in.
#[tracing::instrument(skip_all, fields(columns = job.columns, rows = job.rows))]
pub fn composite(job: &MergeJob, images: &[Raster<'_>]) -> Result<RgbaImage, MergeError> {
    let cell = cell_size(job.sizing, images)?;
    let mut canvas = new_canvas(job.columns, job.rows, cell)?;
    debug!(
        cell_width = cell.width,
        cell_height = cell.height,
        canvas_width = canvas.width(),
        canvas_height = canvas.height(),
        "canvas allocated"
    );

    for (index, (grid, image)) in job.grids.iter().zip(images).enumerate() {
        let rect = cell_rect(index, job.columns, cell);
        draw_cell(&mut canvas, rect, image, grid.background);
        draw_overlays(&mut canvas, job, grid, rect)?;
    }

    Ok(canvas)
}

/// Draw one cell's base raster, clipped to `rect`.
pub fn draw_cell(
    canvas: &mut RgbaImage,
    rect: CellRect,
    image: &RgbaImage,
    background: Option<Rgba<u8>>,
) {
    let clipped = clip_to(image, rect.width, rect.height);
    match background {
        Some(color) => {
            fill_rect(canvas, rect, color);
            imageops::overlay(canvas, &*clipped, rect.x, rect.y);
        }
        None => imageops::replace(canvas, &*clipped, rect.x, rect.y),
    }
}

fn draw_overlays(
    canvas: &mut RgbaImage,
    job: &MergeJob,
    grid: &GridDescriptor,
    rect: CellRect,
) -> Result<(), MergeError> {
    for overlay in &grid.overlays {
        let image = load_local(job, overlay.image.as_ref(), &overlay.path)?;
        let target = rect.translate(overlay.offset_x, overlay.offset_y);
        let clipped = clip_to(&image, target.width, target.height);
        imageops::overlay(canvas, &*clipped, target.x, target.y);
    }
    Ok(())
}

/// Top-left `width × height` of `image`, or all of it when smaller.
fn clip_to(image: &RgbaImage, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    if image.width() <= width && image.height() <= height {
        return Cow::Borrowed(image);
    }
    Cow::Owned(
        imageops::crop_imm(image, 0, 0, width.min(image.width()), height.min(image.height()))
            .to_image(),
    )
}

/// Opaque overwrite of `rect` (clipped to the canvas) with `color`.
fn fill_rect(canvas: &mut RgbaImage, rect: CellRect, color: Rgba<u8>) {
    let x0 = rect.x.clamp(0, canvas.width() as i64) as u32;
    let y0 = rect.y.clamp(0, canvas.height() as i64) as u32;
    let x1 = (rect.x + rect.width as i64).clamp(0, canvas.width() as i64) as u32;
    let y1 = (rect.y + rect.height as i64).clamp(0, canvas.height() as i64) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}
