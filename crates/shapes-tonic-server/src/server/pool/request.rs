use crate::server::repository::{Snapshot, persist::Flush};
use shapes_tonic_core::Result;
use tokio::sync::oneshot;

/// A message sent from the [`WorkerPool`](super::manager::WorkerPool) to an
/// individual worker task.
#[derive(Debug)]
pub enum WorkRequest {
    /// Write `snapshot` to disk unless a newer one already landed.
    ///
    /// - `response`: receives the outcome once the write finished.
    Persist {
        snapshot: Snapshot,
        response: oneshot::Sender<Result<Flush>>,
    },

    /// Request the worker to shut down gracefully.
    ///
    /// - `response`: One-shot channel for acknowledging that the worker has
    ///   completed its shutdown routine.
    Shutdown { response: oneshot::Sender<()> },
}
