//! Merge job description: cells, overlays, sizing policy, and the job builder.
//!
//! A [`MergeJob`] is built once and then only read. `merge` allocates its own
//! working buffers, so one job can be merged repeatedly.
//!
//! ```no_run
//! use gridmerge::{GridDescriptor, MergeJob, Overlay};
//! use image::Rgba;
//!
//! let grids = vec![
//!     GridDescriptor::from_path("a.png").with_background(Rgba([255, 255, 255, 255])),
//!     GridDescriptor::from_path("b.png").with_overlay(Overlay::from_path("badge.png", 5, 5)),
//! ];
//! let canvas = MergeJob::new(grids, 2, 1)
//!     .with_base_dir("images")
//!     .with_fixed_size(200, 200)
//!     .merge()?;
//! # Ok::<(), gridmerge::MergeError>(())
//! ```

use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Deadline for fetching every remote image of one job.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Rule giving every cell the same pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingPolicy {
    /// Size of the first resolved image.
    #[default]
    Default,
    /// Fixed size for every cell. A zero width or height falls back to [`SizingPolicy::Default`].
    FixedSize { width: u32, height: u32 },
    /// Size of the resolved image at this index.
    FromNthImage(usize),
}

/// An image drawn on top of a cell, offset from the cell origin.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub image: Option<RgbaImage>,
    /// Local path, joined under the job's base directory.
    pub path: String,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl Overlay {
    pub fn from_path(path: impl Into<String>, offset_x: i64, offset_y: i64) -> Self {
        Self {
            image: None,
            path: path.into(),
            offset_x,
            offset_y,
        }
    }

    pub fn from_image(image: impl Into<DynamicImage>, offset_x: i64, offset_y: i64) -> Self {
        Self {
            image: Some(image.into().into_rgba8()),
            path: String::new(),
            offset_x,
            offset_y,
        }
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, Default)]
pub struct GridDescriptor {
    /// Pre-decoded raster. When set, `source` is never read.
    pub image: Option<RgbaImage>,
    /// Local path or `http(s)` URL.
    pub source: String,
    /// Fills the whole cell before the image is blended on top.
    pub background: Option<Rgba<u8>>,
    /// Drawn after the cell image, in order.
    pub overlays: Vec<Overlay>,
}

impl GridDescriptor {
    pub fn from_path(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn from_image(image: impl Into<DynamicImage>) -> Self {
        Self {
            image: Some(image.into().into_rgba8()),
            ..Self::default()
        }
    }

    pub fn with_background(mut self, color: Rgba<u8>) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlays.push(overlay);
        self
    }

    /// True when this cell's source is fetched over HTTP.
    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http")
    }
}

/// Everything needed to produce one merged canvas.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub grids: Vec<GridDescriptor>,
    /// Number of cells per row (`ImageCountDX`).
    pub columns: u32,
    /// Number of rows (`ImageCountDY`).
    pub rows: u32,
    pub base_dir: Option<PathBuf>,
    pub sizing: SizingPolicy,
    pub fetch_timeout: Duration,
}

impl MergeJob {
    pub fn new(grids: Vec<GridDescriptor>, columns: u32, rows: u32) -> Self {
        Self {
            grids,
            columns,
            rows,
            base_dir: None,
            sizing: SizingPolicy::Default,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// One plain cell per URL, in order.
    pub fn from_urls<I, S>(urls: I, columns: u32, rows: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grids = urls.into_iter().map(GridDescriptor::from_path).collect();
        Self::new(grids, columns, rows)
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_sizing(mut self, sizing: SizingPolicy) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_fixed_size(self, width: u32, height: u32) -> Self {
        self.with_sizing(SizingPolicy::FixedSize { width, height })
    }

    pub fn with_size_from_nth(self, index: usize) -> Self {
        self.with_sizing(SizingPolicy::FromNthImage(index))
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// True when any top-level cell points at an `http(s)` URL.
    pub fn uses_remote(&self) -> bool {
        self.grids.iter().any(GridDescriptor::is_remote)
    }

    /// Path of a local source: the base directory (if any) with `source` appended.
    ///
    /// `source` always lands under the base directory, even when it starts
    /// with `/`.
    pub fn local_path(&self, source: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) if !base.as_os_str().is_empty() => {
                base.join(source.trim_start_matches('/'))
            }
            _ => Path::new(source).to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_defaults() {
        let job = MergeJob::new(vec![], 2, 3);
        assert_eq!(job.columns, 2);
        assert_eq!(job.rows, 3);
        assert_eq!(job.sizing, SizingPolicy::Default);
        assert_eq!(job.fetch_timeout, Duration::from_secs(60));
        assert!(job.base_dir.is_none());
    }

    #[test]
    fn last_sizing_option_wins() {
        let job = MergeJob::new(vec![], 1, 1)
            .with_fixed_size(10, 20)
            .with_size_from_nth(2);
        assert_eq!(job.sizing, SizingPolicy::FromNthImage(2));

        let job = MergeJob::new(vec![], 1, 1)
            .with_size_from_nth(2)
            .with_fixed_size(10, 20);
        assert_eq!(
            job.sizing,
            SizingPolicy::FixedSize {
                width: 10,
                height: 20
            }
        );
    }

    #[test]
    fn options_are_order_independent() {
        let a = MergeJob::new(vec![], 1, 1)
            .with_base_dir("imgs")
            .with_fixed_size(4, 4);
        let b = MergeJob::new(vec![], 1, 1)
            .with_fixed_size(4, 4)
            .with_base_dir("imgs");
        assert_eq!(a.base_dir, b.base_dir);
        assert_eq!(a.sizing, b.sizing);
    }

    #[test]
    fn from_urls_keeps_order() {
        let job = MergeJob::from_urls(["http://a/1.png", "http://a/2.png"], 2, 1);
        let sources: Vec<&str> = job.grids.iter().map(|g| g.source.as_str()).collect();
        assert_eq!(sources, vec!["http://a/1.png", "http://a/2.png"]);
        assert!(job.uses_remote());
    }

    #[test]
    fn remote_detection_is_prefix_based() {
        assert!(GridDescriptor::from_path("https://example.com/a.jpg").is_remote());
        assert!(GridDescriptor::from_path("http://example.com/a.jpg").is_remote());
        assert!(!GridDescriptor::from_path("images/http.png").is_remote());
        assert!(!GridDescriptor::from_image(RgbaImage::new(1, 1)).is_remote());
    }

    #[test]
    fn any_remote_cell_switches_job_to_remote() {
        let job = MergeJob::new(
            vec![
                GridDescriptor::from_path("a.png"),
                GridDescriptor::from_path("https://example.com/b.png"),
            ],
            2,
            1,
        );
        assert!(job.uses_remote());
        let job = MergeJob::new(vec![GridDescriptor::from_path("a.png")], 1, 1);
        assert!(!job.uses_remote());
    }

    #[test]
    fn local_path_without_base_dir() {
        let job = MergeJob::new(vec![], 1, 1);
        assert_eq!(job.local_path("a/b.png"), PathBuf::from("a/b.png"));
    }

    #[test]
    fn local_path_joins_under_base_dir() {
        let job = MergeJob::new(vec![], 1, 1).with_base_dir("/srv/images");
        assert_eq!(job.local_path("b.png"), PathBuf::from("/srv/images/b.png"));
        assert_eq!(job.local_path("/b.png"), PathBuf::from("/srv/images/b.png"));
    }

    #[test]
    fn descriptor_builders() {
        let cell = GridDescriptor::from_path("a.png")
            .with_background(Rgba([1, 2, 3, 4]))
            .with_overlay(Overlay::from_path("o1.png", 1, 2))
            .with_overlay(Overlay::from_path("o2.png", -3, 4));
        assert_eq!(cell.background, Some(Rgba([1, 2, 3, 4])));
        let paths: Vec<&str> = cell.overlays.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["o1.png", "o2.png"]);
        assert_eq!((cell.overlays[1].offset_x, cell.overlays[1].offset_y), (-3, 4));
    }
}
