//! Image source resolution: turn every top-level cell into a decoded raster.
//!
//! ## Modes
//!
//! The mode is picked once per job by [`MergeJob::uses_remote`]:
//!
//! - **Local**: cells are read one after another from disk. The first failure
//!   aborts the whole resolve.
//! - **Remote**: one task per cell on a current-thread tokio runtime. All tasks
//!   share a single deadline ([`MergeJob::fetch_timeout`]). Results are slotted
//!   by the cell's original index, so completion order never reorders cells.
//!   The first failure seen at the join point is returned and the remaining
//!   tasks are aborted when the task set is dropped.
//!
//! Cells with a pre-decoded raster are never read or fetched, in either mode.
//! Rasters are handed back as [`Raster`]s: borrowed when pre-decoded, owned
//! when loaded.
//!
//! ## Transport
//!
//! HTTP goes through the [`Transport`] trait. [`HttpTransport`] (reqwest) is the
//! production implementation; tests plug in a mock.

use crate::error::{MergeError, TransportError};
use crate::grid::MergeJob;
use crate::imaging::{decode_sniffed, read_image_file};
use image::RgbaImage;
use std::borrow::Cow;
use tokio::task::JoinSet;
use tracing::debug;

/// A resolved cell image.
pub type Raster<'a> = Cow<'a, RgbaImage>;

/// Status and full body of an HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Fetches remote image bytes.
///
/// Implementations are cloned into each fetch task, so cloning should be cheap.
pub trait Transport: Clone + Send + Sync + 'static {
    /// GET `url` and read the whole body. Non-2xx statuses are not errors here.
    fn get(&self, url: &str)
    -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Resolve every top-level cell, picking local or remote mode from the job.
pub fn resolve<'a, T: Transport>(
    job: &'a MergeJob,
    transport: &T,
) -> Result<Vec<Raster<'a>>, MergeError> {
    if job.uses_remote() {
        debug!("resolving {} cells from remote sources", job.grids.len());
        resolve_remote(job, transport)
    } else {
        debug!("resolving {} cells from local files", job.grids.len());
        resolve_local(job)
    }
}

/// Read every cell from disk, in order, stopping at the first failure.
#[tracing::instrument(skip_all, fields(cells = job.grids.len()))]
pub fn resolve_local(job: &MergeJob) -> Result<Vec<Raster<'_>>, MergeError> {
    job.grids
        .iter()
        .map(|grid| load_local(job, grid.image.as_ref(), &grid.source))
        .collect()
}

/// Pre-decoded raster if present, otherwise `source` read from under the base directory.
///
/// Overlays resolve through here whatever the job's mode.
pub(crate) fn load_local<'a>(
    job: &MergeJob,
    image: Option<&'a RgbaImage>,
    source: &str,
) -> Result<Raster<'a>, MergeError> {
    match image {
        Some(image) => Ok(Cow::Borrowed(image)),
        None => read_image_file(&job.local_path(source)).map(Cow::Owned),
    }
}

/// Fetch every cell concurrently on a fresh current-thread runtime.
///
/// Fails with [`MergeError::InsideRuntime`] when called from inside a tokio
/// runtime; async callers use [`fetch_remote`] or
/// [`MergeJob::merge_async`](crate::MergeJob::merge_async).
#[tracing::instrument(skip_all, fields(cells = job.grids.len()))]
pub fn resolve_remote<'a, T: Transport>(
    job: &'a MergeJob,
    transport: &T,
) -> Result<Vec<Raster<'a>>, MergeError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(MergeError::InsideRuntime);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(MergeError::Runtime)?;
    runtime.block_on(fetch_remote(job, transport))
}

/// Fetch every cell concurrently under the job's shared deadline.
pub async fn fetch_remote<'a, T: Transport>(
    job: &'a MergeJob,
    transport: &T,
) -> Result<Vec<Raster<'a>>, MergeError> {
    let mut slots: Vec<Option<Raster<'a>>> = job
        .grids
        .iter()
        .map(|grid| grid.image.as_ref().map(Cow::Borrowed))
        .collect();

    let mut tasks = JoinSet::new();
    for (index, grid) in job.grids.iter().enumerate() {
        if grid.image.is_some() {
            continue;
        }
        let transport = transport.clone();
        let url = grid.source.clone();
        tasks.spawn(async move { (index, fetch_image(&transport, &url).await) });
    }

    let join_all = async {
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(done) => done,
                // Tasks are never aborted while joining, so this is a panic.
                Err(err) => std::panic::resume_unwind(err.into_panic()),
            };
            slots[index] = Some(Cow::Owned(result?));
            debug!(index, "remote image ready");
        }
        Ok::<(), MergeError>(())
    };

    tokio::time::timeout(job.fetch_timeout, join_all)
        .await
        .map_err(|_| MergeError::Timeout(job.fetch_timeout))??;

    Ok(slots.into_iter().flatten().collect())
}

async fn fetch_image<T: Transport>(transport: &T, url: &str) -> Result<RgbaImage, MergeError> {
    let response = transport
        .get(url)
        .await
        .map_err(|source| MergeError::Transport {
            url: url.to_string(),
            source,
        })?;

    if response.status / 100 != 2 {
        return Err(MergeError::HttpStatus {
            url: url.to_string(),
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }

    decode_sniffed(url, &response.body)
}
