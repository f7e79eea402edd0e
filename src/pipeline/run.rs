// src/pipeline/run.rs

//! One full download run: listing task, item stream, downloader pool.

use std::path::PathBuf;

use chrono::Utc;
use reqwest::Client;

use crate::models::ListingQuery;
use crate::pipeline::barrier::{CompletionBarrier, RunResult};
use crate::pipeline::download::DownloaderPool;
use crate::pipeline::stream::spawn_listing;
use crate::services::PhotoClient;

/// Parameters of a download run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub query: ListingQuery,
    pub target_dir: PathBuf,
    /// Worker count, at least one worker always runs
    pub parallel: usize,
    /// Maximum number of photos, negative for no limit
    pub limit: i64,
}

/// List `options.query` and download every photo into the target directory.
///
/// `photos` talks to the API, `downloads` fetches image bytes. The result
/// carries the number of successful downloads and the first error, if any.
pub async fn run_download(photos: PhotoClient, downloads: Client, options: RunOptions) -> RunResult {
    let start_time = Utc::now();
    let RunOptions {
        query,
        target_dir,
        parallel,
        limit,
    } = options;

    log::info!(
        "Downloading {} into {} with {} workers",
        query.source,
        target_dir.display(),
        parallel.max(1)
    );

    let barrier = CompletionBarrier::new();
    let (stream, listing) = spawn_listing(photos, query, limit, barrier.clone());
    let workers = DownloaderPool::new(downloads, target_dir).spawn(stream, parallel, &barrier);

    if let Err(e) = listing.await {
        barrier.record_error(e.into());
    }
    let result = barrier.await_all(workers).await;

    let elapsed = Utc::now() - start_time;
    match &result.error {
        None => log::info!(
            "Downloaded {} of {} photos in {:.1}s",
            result.count,
            result.listed,
            elapsed.num_milliseconds() as f64 / 1000.0
        ),
        Some(e) => log::error!(
            "Run failed after {} of {} photos: {}",
            result.count,
            result.listed,
            e
        ),
    }
    result
}
