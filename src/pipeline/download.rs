// src/pipeline/download.rs

//! Downloader pool: a fixed number of workers draining the item stream.

use std::path::PathBuf;

use reqwest::Client;
use tokio::task::JoinSet;

use crate::error::{AppError, Result};
use crate::models::Photo;
use crate::pipeline::barrier::{CompletionBarrier, RunResult};
use crate::pipeline::stream::ItemStream;
use crate::storage::LocalStorage;
use crate::utils::http::ensure_success;

/// One photo bound for one directory.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub photo: Photo,
    pub target_dir: PathBuf,
}

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
}

impl DownloadJob {
    pub fn new(photo: Photo, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            photo,
            target_dir: target_dir.into(),
        }
    }

    /// Fetch the photo into `<target_dir>/<id>.jpg`.
    ///
    /// The file is created before the request is sent; on failure whatever
    /// was written stays on disk. A record without an id or download link
    /// fails before anything is created.
    pub async fn run(self, client: &Client) -> Result<Downloaded> {
        if !self.photo.is_downloadable() {
            return Err(AppError::invalid_photo(format!(
                "photo {:?} has no id or download link",
                self.photo.id
            )));
        }

        let storage = LocalStorage::new(&self.target_dir);
        let path = storage.photo_path(&self.photo)?;
        storage.ensure_dir().await?;
        let file = storage.create(&path).await?;

        let response = client.get(self.photo.download_url()).send().await?;
        let response = ensure_success(response).await?;
        let bytes = storage.write_body(file, response).await?;

        Ok(Downloaded { path, bytes })
    }
}

/// Fixed-size set of download workers.
#[derive(Debug, Clone)]
pub struct DownloaderPool {
    client: Client,
    target_dir: PathBuf,
}

impl DownloaderPool {
    pub fn new(client: Client, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            target_dir: target_dir.into(),
        }
    }

    /// Start `worker_count` workers on `stream`, reporting into `barrier`.
    pub fn spawn(
        &self,
        stream: ItemStream,
        worker_count: usize,
        barrier: &CompletionBarrier,
    ) -> JoinSet<()> {
        let mut workers = JoinSet::new();
        for id in 0..worker_count.max(1) {
            workers.spawn(worker(
                id,
                stream.clone(),
                self.client.clone(),
                self.target_dir.clone(),
                barrier.clone(),
            ));
        }
        workers
    }

    /// Drain `stream` with `worker_count` workers and wait for all of them.
    pub async fn run(
        &self,
        stream: ItemStream,
        worker_count: usize,
        barrier: CompletionBarrier,
    ) -> RunResult {
        let workers = self.spawn(stream, worker_count, &barrier);
        barrier.await_all(workers).await
    }
}

async fn worker(
    id: usize,
    stream: ItemStream,
    client: Client,
    target_dir: PathBuf,
    barrier: CompletionBarrier,
) {
    while let Some(photo) = stream.next().await {
        let file_name = photo.file_name();
        log::info!("Downloading {} (file={})", photo.download_url(), file_name);

        match DownloadJob::new(photo, &target_dir).run(&client).await {
            Ok(done) => {
                barrier.record_success();
                log::info!(
                    "Finished downloading {} ({} bytes)",
                    done.path.display(),
                    done.bytes
                );
            }
            Err(e) => {
                log::debug!("Worker {id} failed on {file_name}");
                barrier.record_error(e);
            }
        }
    }
    log::debug!("Worker {id} finished");
}
