use super::models::{HistoryEntry, RunStats, Snapshot};
use super::traits::SnapshotStore;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory storage implementation for development/testing
pub struct InMemoryStore {
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
    stats: Arc<Mutex<RunStats>>,
    history: Arc<Mutex<Vec<HistoryEntry>>>,
    fail_snapshot_writes: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(RunStats::default())),
            history: Arc::new(Mutex::new(Vec::new())),
            fail_snapshot_writes: AtomicBool::new(false),
        }
    }

    /// Make every following `save_snapshot` fail, to exercise persistence errors
    pub fn set_fail_snapshot_writes(&self, fail: bool) {
        self.fail_snapshot_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of snapshots saved so far
    pub fn snapshot_count(&self) -> Result<usize> {
        Ok(lock(&self.snapshots)?.len())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ScoutError::persistence("in-memory store lock poisoned"))
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
        Ok(lock(&self.snapshots)?.last().cloned())
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_snapshot_writes.load(Ordering::SeqCst) {
            return Err(ScoutError::persistence("snapshot writes disabled"));
        }
        lock(&self.snapshots)?.push(snapshot.clone());
        debug!("Saved snapshot {} with {} offers", snapshot.id, snapshot.count);
        Ok(())
    }

    async fn load_stats(&self) -> Result<RunStats> {
        Ok(lock(&self.stats)?.clone())
    }

    async fn save_stats(&self, stats: &RunStats) -> Result<()> {
        *lock(&self.stats)? = stats.clone();
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(lock(&self.history)?.clone())
    }

    async fn save_history(&self, history: &[HistoryEntry]) -> Result<()> {
        *lock(&self.history)? = history.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_failed_write_keeps_previous_snapshot() {
        let store = InMemoryStore::new();
        let first = Snapshot::new(Vec::new(), Utc::now()).unwrap();
        store.save_snapshot(&first).await.unwrap();

        store.set_fail_snapshot_writes(true);
        let second = Snapshot::new(Vec::new(), Utc::now()).unwrap();
        assert!(store.save_snapshot(&second).await.is_err());

        let latest = store.latest_snapshot().await.unwrap().unwrap();
        assert_eq!(latest.id, first.id);
        assert_eq!(store.snapshot_count().unwrap(), 1);
    }
}
