//! Merge orchestration: validate, resolve, composite.
//!
//! [`MergeJob::merge`] is the entry point of the core, with
//! [`MergeJob::merge_async`] as its counterpart for callers already on a tokio
//! runtime. Both pick the acquisition mode, resolve every cell, fail on an
//! empty result, and hand the rasters to the layout engine. Nothing here logs
//! failures; they are returned to the caller.

use crate::error::MergeError;
use crate::grid::MergeJob;
use crate::layout::composite;
use crate::resolve::{HttpTransport, Raster, Transport, fetch_remote, resolve, resolve_local};
use image::RgbaImage;
use tracing::debug;

impl MergeJob {
    /// Fetch or read every cell and composite them into one canvas.
    ///
    /// Remote cells are fetched with a default [`HttpTransport`]. Blocks the
    /// calling thread. With remote cells, calling this from inside a tokio
    /// runtime fails with [`MergeError::InsideRuntime`]; use
    /// [`merge_async`](Self::merge_async) there.
    pub fn merge(&self) -> Result<RgbaImage, MergeError> {
        self.merge_with_transport(&HttpTransport::default())
    }

    /// [`merge`](Self::merge) with a caller-supplied transport.
    #[tracing::instrument(skip_all, fields(cells = self.grids.len(), remote = self.uses_remote()))]
    pub fn merge_with_transport<T: Transport>(&self, transport: &T) -> Result<RgbaImage, MergeError> {
        self.check_grid()?;
        let images = resolve(self, transport)?;
        self.finish(&images)
    }

    /// Async [`merge`](Self::merge), running remote fetches on the caller's runtime.
    ///
    /// Local files are still read synchronously.
    pub async fn merge_async(&self) -> Result<RgbaImage, MergeError> {
        self.merge_with_transport_async(&HttpTransport::default()).await
    }

    /// [`merge_async`](Self::merge_async) with a caller-supplied transport.
    #[tracing::instrument(skip_all, fields(cells = self.grids.len(), remote = self.uses_remote()))]
    pub async fn merge_with_transport_async<T: Transport>(
        &self,
        transport: &T,
    ) -> Result<RgbaImage, MergeError> {
        self.check_grid()?;
        let images = if self.uses_remote() {
            fetch_remote(self, transport).await?
        } else {
            resolve_local(self)?
        };
        self.finish(&images)
    }

    fn check_grid(&self) -> Result<(), MergeError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(MergeError::InvalidGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        let expected = self.columns as usize * self.rows as usize;
        if self.grids.len() != expected {
            debug!(
                cells = self.grids.len(),
                expected, "cell count does not match grid; extra cells are clipped, missing cells stay empty"
            );
        }
        Ok(())
    }

    fn finish(&self, images: &[Raster<'_>]) -> Result<RgbaImage, MergeError> {
        if images.is_empty() {
            return Err(MergeError::EmptyInput);
        }
        composite(self, images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridDescriptor, Overlay};
    use crate::resolve::tests::{MockReply, MockTransport};
    use crate::test_helpers::{encode_solid_png, write_solid_png};
    use image::{Pixel, Rgba};
    use tempfile::TempDir;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

    fn quadrant_fixtures(tmp: &TempDir) -> Vec<GridDescriptor> {
        let names = [("red.png", RED), ("green.png", GREEN), ("blue.png", BLUE), ("yellow.png", YELLOW)];
        names
            .iter()
            .map(|(name, color)| {
                write_solid_png(&tmp.path().join(name), 10, 10, *color);
                GridDescriptor::from_path(*name)
            })
            .collect()
    }

    fn quadrant_color(canvas: &RgbaImage, qx: u32, qy: u32) -> Rgba<u8> {
        let first = *canvas.get_pixel(qx * 10, qy * 10);
        for y in qy * 10..qy * 10 + 10 {
            for x in qx * 10..qx * 10 + 10 {
                assert_eq!(canvas.get_pixel(x, y), &first, "quadrant ({qx}, {qy}) not solid at ({x}, {y})");
            }
        }
        first
    }

    // =========================================================================
    // Local mode
    // =========================================================================

    #[test]
    fn local_two_by_two_quadrants() {
        let tmp = TempDir::new().unwrap();
        let job = MergeJob::new(quadrant_fixtures(&tmp), 2, 2).with_base_dir(tmp.path());

        let canvas = job.merge().unwrap();
        assert_eq!(canvas.dimensions(), (20, 20));
        assert_eq!(quadrant_color(&canvas, 0, 0), RED);
        assert_eq!(quadrant_color(&canvas, 1, 0), GREEN);
        assert_eq!(quadrant_color(&canvas, 0, 1), BLUE);
        assert_eq!(quadrant_color(&canvas, 1, 1), YELLOW);
    }

    #[test]
    fn reordering_descriptors_reorders_cells() {
        let tmp = TempDir::new().unwrap();
        let mut grids = quadrant_fixtures(&tmp);
        grids.swap(0, 3);
        let job = MergeJob::new(grids, 2, 2).with_base_dir(tmp.path());

        let canvas = job.merge().unwrap();
        assert_eq!(quadrant_color(&canvas, 0, 0), YELLOW);
        assert_eq!(quadrant_color(&canvas, 1, 1), RED);
    }

    #[test]
    fn zero_descriptors_is_empty_input() {
        let job = MergeJob::new(vec![], 2, 2);
        let err = job.merge().unwrap_err();
        assert!(matches!(err, MergeError::EmptyInput));
        assert_eq!(err.to_string(), "there is no image to merge");
    }

    #[test]
    fn zero_columns_is_rejected_before_io() {
        let job = MergeJob::new(vec![GridDescriptor::from_path("missing.png")], 0, 1);
        assert!(matches!(
            job.merge().unwrap_err(),
            MergeError::InvalidGrid { columns: 0, rows: 1 }
        ));
    }

    #[test]
    fn nth_sizing_out_of_range() {
        let tmp = TempDir::new().unwrap();
        let job = MergeJob::new(quadrant_fixtures(&tmp), 2, 2)
            .with_base_dir(tmp.path())
            .with_size_from_nth(4);
        assert!(matches!(
            job.merge().unwrap_err(),
            MergeError::IndexOutOfRange { index: 4, len: 4 }
        ));
    }

    #[test]
    fn nth_sizing_uses_that_image() {
        let tmp = TempDir::new().unwrap();
        write_solid_png(&tmp.path().join("small.png"), 2, 2, RED);
        write_solid_png(&tmp.path().join("wide.png"), 6, 3, BLUE);
        let job = MergeJob::new(
            vec![
                GridDescriptor::from_path("small.png"),
                GridDescriptor::from_path("wide.png"),
            ],
            2,
            1,
        )
        .with_base_dir(tmp.path())
        .with_size_from_nth(1);

        let canvas = job.merge().unwrap();
        assert_eq!(canvas.dimensions(), (12, 3));
    }

    #[test]
    fn fixed_size_canvas_regardless_of_images() {
        let tmp = TempDir::new().unwrap();
        let job = MergeJob::new(quadrant_fixtures(&tmp), 2, 2)
            .with_base_dir(tmp.path())
            .with_fixed_size(7, 3);
        assert_eq!(job.merge().unwrap().dimensions(), (14, 6));
    }

    #[test]
    fn overlay_scenario() {
        let tmp = TempDir::new().unwrap();
        write_solid_png(&tmp.path().join("base.png"), 4, 4, RED);
        let overlay_color = Rgba([0, 0, 255, 128]);
        write_solid_png(&tmp.path().join("badge.png"), 3, 3, overlay_color);

        let cell = GridDescriptor::from_path("base.png")
            .with_background(GREEN)
            .with_overlay(Overlay::from_path("badge.png", 5, 5));
        let job = MergeJob::new(vec![cell], 1, 1)
            .with_base_dir(tmp.path())
            .with_fixed_size(10, 10);

        let canvas = job.merge().unwrap();
        let mut expected = GREEN;
        expected.blend(&overlay_color);
        assert_eq!(canvas.get_pixel(5, 5), &expected);
        assert_eq!(canvas.get_pixel(3, 3), &RED);
        assert_eq!(canvas.get_pixel(9, 0), &GREEN);
    }

    #[test]
    fn merging_twice_gives_identical_canvases() {
        let tmp = TempDir::new().unwrap();
        let job = MergeJob::new(quadrant_fixtures(&tmp), 2, 2).with_base_dir(tmp.path());
        assert_eq!(job.merge().unwrap(), job.merge().unwrap());
    }

    // =========================================================================
    // Remote mode (mock transport)
    // =========================================================================

    #[test]
    fn remote_two_by_two_quadrants() {
        let urls = ["http://img/0.png", "http://img/1.png", "http://img/2.png", "http://img/3.png"];
        let colors = [RED, GREEN, BLUE, YELLOW];
        let transport = MockTransport::new(
            urls.iter()
                .zip(colors)
                .map(|(url, color)| (*url, MockReply::ok(encode_solid_png(10, 10, color))))
                .collect(),
        );

        let canvas = MergeJob::from_urls(urls, 2, 2)
            .merge_with_transport(&transport)
            .unwrap();
        assert_eq!(quadrant_color(&canvas, 0, 0), RED);
        assert_eq!(quadrant_color(&canvas, 1, 1), YELLOW);
    }

    #[test]
    fn any_failing_fetch_fails_the_merge() {
        let urls = ["http://img/0.png", "http://img/1.png", "http://img/2.png", "http://img/3.png"];
        for failing in 0..urls.len() {
            let transport = MockTransport::new(
                urls.iter()
                    .enumerate()
                    .map(|(i, url)| {
                        let reply = if i == failing {
                            MockReply::status(503, "unavailable")
                        } else {
                            MockReply::ok(encode_solid_png(2, 2, RED))
                        };
                        (*url, reply)
                    })
                    .collect(),
            );
            let err = MergeJob::from_urls(urls, 2, 2)
                .merge_with_transport(&transport)
                .unwrap_err();
            assert_eq!(err.status(), Some(503), "failing index {failing}");
        }
    }

    // =========================================================================
    // Inside an async runtime
    // =========================================================================

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn quadrant_transport(urls: &[&str]) -> MockTransport {
        let colors = [RED, GREEN, BLUE, YELLOW];
        MockTransport::new(
            urls.iter()
                .zip(colors)
                .map(|(url, color)| (*url, MockReply::ok(encode_solid_png(10, 10, color))))
                .collect(),
        )
    }

    #[test]
    fn blocking_remote_merge_inside_runtime_is_an_error() {
        let urls = ["http://img/0.png"];
        let transport = quadrant_transport(&urls);
        let job = MergeJob::from_urls(urls, 1, 1);

        let err = runtime()
            .block_on(async { job.merge_with_transport(&transport) })
            .unwrap_err();
        assert!(matches!(err, MergeError::InsideRuntime), "{err:?}");
        assert!(transport.requested().is_empty());
    }

    #[test]
    fn blocking_local_merge_inside_runtime_still_works() {
        let tmp = TempDir::new().unwrap();
        let job = MergeJob::new(quadrant_fixtures(&tmp), 2, 2).with_base_dir(tmp.path());

        let canvas = runtime().block_on(async { job.merge() }).unwrap();
        assert_eq!(quadrant_color(&canvas, 1, 1), YELLOW);
    }

    #[test]
    fn async_remote_two_by_two_quadrants() {
        let urls = ["http://img/0.png", "http://img/1.png", "http://img/2.png", "http://img/3.png"];
        let transport = quadrant_transport(&urls);
        let job = MergeJob::from_urls(urls, 2, 2);

        let canvas = runtime()
            .block_on(job.merge_with_transport_async(&transport))
            .unwrap();
        assert_eq!(canvas, job.merge_with_transport(&transport).unwrap());
        assert_eq!(quadrant_color(&canvas, 0, 0), RED);
        assert_eq!(quadrant_color(&canvas, 1, 0), GREEN);
        assert_eq!(quadrant_color(&canvas, 0, 1), BLUE);
        assert_eq!(quadrant_color(&canvas, 1, 1), YELLOW);
    }

    #[test]
    fn async_merge_checks_grid_and_empty_input() {
        let rt = runtime();
        let transport = MockTransport::new(vec![]);

        let err = rt
            .block_on(MergeJob::new(vec![], 0, 2).merge_with_transport_async(&transport))
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidGrid { columns: 0, rows: 2 }));

        let err = rt
            .block_on(MergeJob::new(vec![], 2, 2).merge_with_transport_async(&transport))
            .unwrap_err();
        assert!(matches!(err, MergeError::EmptyInput));
    }

    #[test]
    fn async_local_merge() {
        let tmp = TempDir::new().unwrap();
        let job = MergeJob::new(quadrant_fixtures(&tmp), 2, 2).with_base_dir(tmp.path());

        let canvas = runtime().block_on(job.merge_async()).unwrap();
        assert_eq!(quadrant_color(&canvas, 0, 0), RED);
    }

    #[test]
    fn remote_cells_with_local_overlays() {
        let tmp = TempDir::new().unwrap();
        write_solid_png(&tmp.path().join("badge.png"), 1, 1, GREEN);
        let transport =
            MockTransport::new(vec![("http://img/a.png", MockReply::ok(encode_solid_png(4, 4, RED)))]);
        let cell = GridDescriptor::from_path("http://img/a.png")
            .with_overlay(Overlay::from_path("badge.png", 2, 2));
        let job = MergeJob::new(vec![cell], 1, 1).with_base_dir(tmp.path());

        let canvas = job.merge_with_transport(&transport).unwrap();
        assert_eq!(canvas.get_pixel(2, 2), &GREEN);
        assert_eq!(canvas.get_pixel(0, 0), &RED);
    }
}
