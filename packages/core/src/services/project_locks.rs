//! Per-project advisory locks
//!
//! `NodeService` takes the project's lock for the whole of a structural
//! mutation (create, rename, move, reorder, delete). Two moves in the same
//! project are therefore checked and applied one after the other, so a pair
//! of moves that would only form a cycle together can't both pass the
//! ancestor walk. Different projects never contend.
//!
//! Serialization only holds between callers sharing one `ProjectLocks`
//! instance. Services that write the same store must be built with the same
//! `Arc<ProjectLocks>` (see `NodeService::with_locks`).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created mutex per project id
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the project's lock until the guard is dropped
    ///
    /// Entries nobody holds or waits on are pruned on the way in.
    pub async fn lock(&self, project_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(project_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of projects with a live lock entry
    pub async fn tracked_projects(&self) -> usize {
        self.locks.lock().await.len()
    }
}
