use super::request::WorkRequest;
use crate::server::repository::persist::SnapshotWriter;
use shapes_tonic_core::Error;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// Requests are handled in arrival order, so a [`WorkRequest::Shutdown`]
/// queued behind pending flushes only takes effect after they are written.
///
/// # Arguments
///
/// - `worker_id`: Numeric identifier for this worker (used in logs).
/// - `rx`: Receiver through which [`WorkRequest`]s are received.
/// - `writer`: Snapshot writer shared by every worker.
pub async fn worker_loop(
    worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    writer: Arc<SnapshotWriter>,
) {
    tracing::trace!("Worker {worker_id} started, flushing to {}", writer.path().display());

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Persist { snapshot, response } => {
                let version = snapshot.version;
                let writer = Arc::clone(&writer);
                let result = tokio::task::spawn_blocking(move || writer.write(&snapshot))
                    .await
                    .unwrap_or_else(|e| {
                        Err(Error::Persistence {
                            reason: format!("flush task failed: {e}"),
                        })
                    });

                tracing::debug!(worker_id, version, ?result, "Flush finished");
                if response.send(result).is_err() {
                    tracing::trace!("Worker {worker_id}: flush requester went away");
                }
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}
