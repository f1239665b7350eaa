use super::models::{HistoryEntry, RunStats, Snapshot};
use crate::error::Result;
use async_trait::async_trait;

/// Storage trait for persisting snapshots, run statistics and run history
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    // Snapshot operations
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>>;
    /// Must be all-or-nothing: on error the previous snapshot stays latest
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    // Statistics operations
    async fn load_stats(&self) -> Result<RunStats>;
    async fn save_stats(&self, stats: &RunStats) -> Result<()>;

    // History operations
    async fn load_history(&self) -> Result<Vec<HistoryEntry>>;
    async fn save_history(&self, history: &[HistoryEntry]) -> Result<()>;
}
