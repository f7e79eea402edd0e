// src/pipeline/stream.rs

//! Item stream between the listing task and the download workers.
//!
//! One producer, many consumers, unbounded buffer. The producer owns the
//! only sender, so the stream closes exactly once: when the producer is
//! closed or dropped.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{ListingQuery, Photo};
use crate::pipeline::barrier::CompletionBarrier;
use crate::services::PhotoClient;

/// Consumer side, shared by all workers.
#[derive(Debug, Clone)]
pub struct ItemStream {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Photo>>>,
    cancel: CancellationToken,
}

impl ItemStream {
    /// Next photo, or `None` once the stream is closed and drained or the
    /// run was cancelled.
    pub async fn next(&self) -> Option<Photo> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            photo = receiver.recv() => photo,
        }
    }
}

/// Producer side with the item limit.
#[derive(Debug)]
pub struct Producer {
    sender: Option<mpsc::UnboundedSender<Photo>>,
    limit: i64,
    sent: usize,
    cancel: CancellationToken,
}

impl Producer {
    /// Forward a photo unless the limit is reached or the run is cancelled.
    ///
    /// Returns `Break` once no more photos should be listed.
    pub fn offer(&mut self, photo: Photo) -> ControlFlow<()> {
        if self.limit_reached() || self.cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        let Some(sender) = &self.sender else {
            return ControlFlow::Break(());
        };
        if sender.send(photo).is_err() {
            log::debug!("All consumers are gone, stopping listing");
            return ControlFlow::Break(());
        }

        self.sent += 1;
        if self.limit_reached() {
            log::info!("Reached limit of {} photos", self.limit);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn limit_reached(&self) -> bool {
        self.limit >= 0 && self.sent as u64 >= self.limit as u64
    }

    /// Photos forwarded so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Close the stream; returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        match self.sender.take() {
            Some(sender) => {
                drop(sender);
                log::debug!("Item stream closed after {} photos", self.sent);
                true
            }
            None => false,
        }
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Create a connected producer and stream.
///
/// A negative `limit` forwards every photo.
pub fn item_stream(limit: i64, cancel: CancellationToken) -> (Producer, ItemStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let producer = Producer {
        sender: Some(sender),
        limit,
        sent: 0,
        cancel: cancel.clone(),
    };
    let stream = ItemStream {
        receiver: Arc::new(Mutex::new(receiver)),
        cancel,
    };
    (producer, stream)
}

/// Run the listing on its own task, feeding the returned stream.
///
/// A listing error is recorded in `barrier` before the stream closes. The
/// task yields the number of photos forwarded.
pub fn spawn_listing(
    client: PhotoClient,
    query: ListingQuery,
    limit: i64,
    barrier: CompletionBarrier,
) -> (ItemStream, JoinHandle<usize>) {
    let cancel = barrier.cancel_token().clone();
    let (mut producer, stream) = item_stream(limit, cancel.clone());
    let client = client.with_cancellation(cancel);

    let handle = tokio::spawn(async move {
        log::info!("Listing {} ordered by {}", query.source, query.order);
        let result = client
            .list_photos(&query, |photo| Ok(producer.offer(photo)))
            .await;

        if let Err(e) = result {
            log::error!("Listing {} failed", query.source);
            barrier.record_error(e);
        }

        let listed = producer.sent();
        barrier.record_listed(listed);
        producer.close();
        listed
    });

    (stream, handle)
}
