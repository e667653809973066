use super::Snapshot;
use parking_lot::Mutex;
use shapes_tonic_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Outcome of a flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    Written,
    /// A snapshot at least this recent is already on disk.
    Stale,
}

/// Writes repository snapshots to a single file, newest wins.
///
/// Snapshots may reach the writer out of order when several workers flush
/// concurrently. The writer remembers the last version it wrote and drops
/// anything older, so the file only ever moves forward.
#[derive(Debug)]
pub struct SnapshotWriter {
    path: PathBuf,
    written: Mutex<u64>,
}

impl SnapshotWriter {
    /// Creates a writer for `path`. `loaded` is the version already on disk.
    pub fn new(path: PathBuf, loaded: u64) -> Self {
        Self {
            path,
            written: Mutex::new(loaded),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking. Call from `spawn_blocking` or a test.
    pub fn write(&self, snapshot: &Snapshot) -> Result<Flush> {
        let mut written = self.written.lock();
        if snapshot.version <= *written {
            return Ok(Flush::Stale);
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &snapshot.bytes)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| Error::Persistence {
                reason: format!("failed to write {}: {e}", self.path.display()),
            })?;

        *written = snapshot.version;
        Ok(Flush::Written)
    }
}
