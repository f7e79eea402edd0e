//! Download pipeline.
//!
//! - `spawn_listing`: list photos on a task and feed an [`ItemStream`]
//! - `DownloaderPool`: drain the stream with a fixed number of workers
//! - `CompletionBarrier`: count completions and keep the first error
//! - `run_download`: wire the three together

pub mod barrier;
pub mod download;
pub mod run;
pub mod stream;

pub use barrier::{CompletionBarrier, RunResult};
pub use download::{DownloadJob, Downloaded, DownloaderPool};
pub use run::{RunOptions, run_download};
pub use stream::{ItemStream, Producer, item_stream, spawn_listing};
