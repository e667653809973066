//! Asynchronous worker pool for repository flushes.
//!
//! This module defines the [`WorkerPool`] struct, which manages a set of
//! asynchronous workers responsible for processing [`WorkRequest`]s. It
//! distributes work using round-robin scheduling and supports coordinated
//! shutdown via a shared [`CancellationToken`].
//!
//! Each worker listens on its own bounded [`mpsc::Receiver`] and executes
//! requests one at a time.

use super::{request::WorkRequest, worker::worker_loop};
use crate::server::repository::{Snapshot, persist::Flush, persist::SnapshotWriter};
use core::time::Duration;
use shapes_tonic_core::{Error, Result};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

/// Per-worker queue depth. Flushes are small and rare, a short queue is
/// enough to absorb bursts of `CreateShape` calls.
const WORK_QUEUE_DEPTH: usize = 16;

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
///
/// Workers receive requests over bounded MPSC channels. Work is distributed in
/// round-robin fashion and the pool supports graceful, cancellable shutdown.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Constructs a new [`WorkerPool`] from initialized worker channels and a
    /// shared cancellation token.
    pub const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            shutdown_timeout,
        }
    }

    /// Spawns `num_workers` worker tasks sharing `writer`.
    pub fn spawn(num_workers: usize, writer: Arc<SnapshotWriter>, shutdown_timeout: Duration) -> Self {
        let workers = (0..num_workers.max(1))
            .map(|worker_id| {
                let (tx, rx) = mpsc::channel(WORK_QUEUE_DEPTH);
                tokio::spawn(worker_loop(worker_id, rx, Arc::clone(&writer)));
                tx
            })
            .collect();

        Self::new(workers, CancellationToken::new(), shutdown_timeout)
    }

    /// Returns the index of the next worker to receive work (round-robin).
    ///
    /// Uses a relaxed atomic increment to minimize contention.
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Sends a [`WorkRequest`] to the next available worker in the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down (`shutdown_token` was cancelled).
    /// - The worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<()> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Flushes `snapshot` on the next worker and waits for the outcome.
    pub async fn persist(&self, snapshot: Snapshot) -> Result<Flush> {
        let (tx, rx) = oneshot::channel();
        self.send_to_next_worker(WorkRequest::Persist {
            snapshot,
            response: tx,
        })
        .await?;

        rx.await.map_err(|_| Error::ChannelError {
            context: "Worker dropped flush response".to_string(),
        })?
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Cancels the shared [`CancellationToken`] to refuse new flushes.
    /// - Sends a [`WorkRequest::Shutdown`] to each worker, queued behind any
    ///   flush it already accepted.
    /// - Waits up to `shutdown_timeout` for all acknowledgements.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Refusing new flushes");
        self.shutdown_token.cancel();

        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("Failed to send shutdown to worker {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        let acks = futures::future::join_all(shutdown_handles.into_iter().map(|(i, rx)| async move {
            match rx.await {
                Ok(()) => tracing::trace!("Worker {i} shutdown acknowledged"),
                Err(e) => tracing::error!("Worker {i} returned error: {e}"),
            }
        }));

        if timeout(self.shutdown_timeout, acks).await.is_err() {
            tracing::warn!(
                "Worker shutdown timed out after {:?}",
                self.shutdown_timeout
            );
            return Err(Error::ChannelError {
                context: "Timed out waiting for workers to drain".to_string(),
            });
        }

        tracing::info!("Worker pool shutdown complete");
        Ok(())
    }
}
