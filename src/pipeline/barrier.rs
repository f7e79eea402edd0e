// src/pipeline/barrier.rs

//! Completion barrier: joins the workers and keeps the first error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};

/// Aggregate outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Photos downloaded successfully
    pub count: usize,
    /// Photos that entered the item stream
    pub listed: usize,
    /// First error observed, by completion time
    pub error: Option<AppError>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The downloaded count, or the first error.
    pub fn into_result(self) -> Result<usize> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.count),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    first_error: Mutex<Option<AppError>>,
    completed: AtomicUsize,
    listed: AtomicUsize,
    cancel: CancellationToken,
}

/// Shared result collector for the listing task and the download workers.
///
/// The first recorded error wins and cancels the run, so idle workers stop
/// pulling items and pagination halts; in-flight downloads still finish.
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    shared: Arc<Shared>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled on the first error.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.shared.cancel
    }

    pub fn record_success(&self) {
        self.shared.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_listed(&self, listed: usize) {
        self.shared.listed.store(listed, Ordering::SeqCst);
    }

    /// Record a failure; returns `true` if it became the run's error.
    pub fn record_error(&self, err: AppError) -> bool {
        let mut slot = self
            .shared
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if slot.is_some() {
            log::warn!("Discarding later error: {err}");
            return false;
        }

        log::error!("{err}");
        *slot = Some(err);
        drop(slot);
        self.shared.cancel.cancel();
        true
    }

    /// Wait for every worker to finish and collect the outcome.
    pub async fn await_all(&self, mut workers: JoinSet<()>) -> RunResult {
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                self.record_error(e.into());
            }
        }

        let error = self
            .shared
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        RunResult {
            count: self.shared.completed.load(Ordering::SeqCst),
            listed: self.shared.listed.load(Ordering::SeqCst),
            error,
        }
    }
}
