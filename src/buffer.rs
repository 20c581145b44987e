// Latest encoded snapshot, shared by the scraper (writer), push sender and pull handler (readers).

use bytes::Bytes;
use std::sync::{PoisonError, RwLock};

use crate::encoder::Snapshot;

/// Holds only the most recent snapshot. Replacement swaps a whole `Bytes` handle under the
/// write lock, so readers see either the old or the new snapshot, never a mix.
#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    data: RwLock<Bytes>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: &Snapshot) {
        self.publish_bytes(snapshot.to_bytes());
    }

    pub fn publish_bytes(&self, bytes: Bytes) {
        // A swap cannot leave the value half-written, so a poisoned lock is still usable.
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = bytes;
    }

    /// Cheap handle to the current bytes; the lock is released before this returns.
    pub fn read_snapshot(&self) -> Bytes {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
