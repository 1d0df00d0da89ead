//! Job file module.
//!
//! Loads and validates the TOML job files run by `gridmerge merge`, and turns
//! them into a [`MergeJob`]. The library API does not need a job file; this is
//! the CLI's configuration layer.
//!
//! ## Job File Format
//!
//! ```toml
//! columns = 2
//! rows = 2
//! base_dir = "images"        # optional, relative to the job file
//! fetch_timeout_secs = 60    # deadline for all remote fetches
//!
//! [sizing]
//! mode = "default"           # "default" | "fixed" | "nth"
//!
//! [output]
//! path = "merged.jpg"        # .jpg/.jpeg or .png
//! quality = 90               # JPEG only, 1-100
//!
//! [[grids]]
//! path = "a.png"
//! background = "#ffffff"     # optional, #rrggbb or #rrggbbaa
//!
//! [[grids.overlays]]
//! path = "badge.png"
//! offset = [5, 5]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::grid::{GridDescriptor, MergeJob, Overlay, SizingPolicy};
use crate::imaging::Quality;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Job validation error: {0}")]
    Validation(String),
}

/// A merge job as written in a TOML job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub columns: u32,
    pub rows: u32,
    /// Prepended to every local path. Relative values are resolved against the
    /// job file's directory.
    pub base_dir: Option<PathBuf>,
    /// Deadline in seconds for fetching all remote images.
    pub fetch_timeout_secs: u64,
    pub sizing: SizingConfig,
    pub output: OutputConfig,
    pub grids: Vec<GridConfig>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            columns: 1,
            rows: 1,
            base_dir: None,
            fetch_timeout_secs: 60,
            sizing: SizingConfig::default(),
            output: OutputConfig::default(),
            grids: Vec::new(),
        }
    }
}

/// Cell sizing, tagged by `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SizingConfig {
    /// Size of the first image.
    #[default]
    Default,
    /// Every cell is exactly `width × height`.
    Fixed { width: u32, height: u32 },
    /// Size of the image at `index`.
    Nth { index: usize },
}

impl From<SizingConfig> for SizingPolicy {
    fn from(config: SizingConfig) -> Self {
        match config {
            SizingConfig::Default => SizingPolicy::Default,
            SizingConfig::Fixed { width, height } => SizingPolicy::FixedSize { width, height },
            SizingConfig::Nth { index } => SizingPolicy::FromNthImage(index),
        }
    }
}

/// Where and how the merged image is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output path. Relative values are resolved against the job file's directory.
    pub path: Option<PathBuf>,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            quality: 90,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Local path or `http(s)` URL.
    pub path: String,
    pub background: Option<String>,
    pub overlays: Vec<OverlayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// Local path, always read from disk.
    pub path: String,
    /// `[x, y]` pixel offset from the cell's top-left corner.
    pub offset: [i64; 2],
}

impl JobConfig {
    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::Validation(
                "columns and rows must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch_timeout_secs must be non-zero".into(),
            ));
        }
        if let SizingConfig::Fixed { width, height } = self.sizing
            && (width == 0 || height == 0)
        {
            return Err(ConfigError::Validation(
                "sizing width and height must be non-zero".into(),
            ));
        }
        for (index, grid) in self.grids.iter().enumerate() {
            if grid.path.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "grids[{index}].path must not be empty"
                )));
            }
            if let Some(color) = &grid.background {
                parse_color(color).map_err(|e| {
                    ConfigError::Validation(format!("grids[{index}].background: {e}"))
                })?;
            }
            for (o, overlay) in grid.overlays.iter().enumerate() {
                if overlay.path.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "grids[{index}].overlays[{o}].path must not be empty"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.output.quality)
    }

    /// Output path resolved against `job_dir`, if one was configured.
    pub fn output_path(&self, job_dir: &Path) -> Option<PathBuf> {
        self.output.path.as_ref().map(|p| job_dir.join(p))
    }

    /// Build the merge job. Relative `base_dir` is resolved against `job_dir`.
    pub fn to_job(&self, job_dir: &Path) -> Result<MergeJob, ConfigError> {
        let grids = self
            .grids
            .iter()
            .map(|grid| -> Result<GridDescriptor, ConfigError> {
                let mut cell = GridDescriptor::from_path(grid.path.as_str());
                cell.background = grid.background.as_deref().map(parse_color).transpose()?;
                cell.overlays = grid
                    .overlays
                    .iter()
                    .map(|o| Overlay::from_path(o.path.as_str(), o.offset[0], o.offset[1]))
                    .collect();
                Ok(cell)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut job = MergeJob::new(grids, self.columns, self.rows)
            .with_sizing(self.sizing.into())
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs));
        if let Some(base) = &self.base_dir {
            job = job.with_base_dir(job_dir.join(base));
        }
        Ok(job)
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` into a color. `#rrggbb` is fully opaque.
pub fn parse_color(value: &str) -> Result<Rgba<u8>, ConfigError> {
    let invalid = || {
        ConfigError::Validation(format!(
            "invalid color {value:?}, expected #rrggbb or #rrggbbaa"
        ))
    };
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

/// Load and validate a job file.
pub fn load_job(path: &Path) -> Result<JobConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock job file with all keys and explanations.
///
/// Used by the `gen-job` CLI command.
pub fn stock_job_toml() -> &'static str {
    r##"# gridmerge job file
# ==================
# Describes one merged image: the grid shape, how big each cell is, and
# which image goes in each cell. Unknown keys cause an error.

# Grid shape. Cells are filled row by row, left to right.
columns = 2
rows = 2

# Directory prepended to every local path (cells and overlays).
# Relative values are resolved against this file's directory.
# base_dir = "images"

# Deadline in seconds for downloading all remote (http/https) images.
# If any cell is a URL, every cell is downloaded concurrently.
fetch_timeout_secs = 60

# ---------------------------------------------------------------------------
# Cell size
# ---------------------------------------------------------------------------
[sizing]
# "default": every cell takes the size of the first image.
# "fixed":   every cell is width x height; add `width` and `height`.
# "nth":     every cell takes the size of image number `index` (0-based).
# Images are never scaled: larger ones are clipped at the cell edge.
mode = "default"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# .jpg/.jpeg or .png. Relative to this file's directory.
path = "merged.jpg"

# JPEG encoding quality (1 = worst, 100 = best). Ignored for PNG.
quality = 90

# ---------------------------------------------------------------------------
# Cells
# ---------------------------------------------------------------------------
# One [[grids]] entry per cell. Local files ending in .jpg/.jpeg are read as
# JPEG, everything else as PNG. Remote images may be JPEG or PNG.
[[grids]]
path = "01.png"
# Fill the cell with this color first, then blend the image on top.
# background = "#ffffff"

# Images drawn on top of the cell, in order, offset from its top-left corner.
# Overlays are always read from local files.
# [[grids.overlays]]
# path = "badge.png"
# offset = [5, 5]

[[grids]]
path = "02.png"

[[grids]]
path = "03.png"

[[grids]]
path = "04.png"
"##
}
