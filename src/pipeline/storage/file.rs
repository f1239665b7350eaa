use super::models::{HistoryEntry, RunStats, Snapshot};
use super::traits::SnapshotStore;
use crate::constants::{HISTORY_FILE, SNAPSHOT_FILE, STATS_FILE};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

/// JSON files under a data directory.
///
/// Writes land in a temporary sibling that is synced and then renamed over
/// the target, so a reader only ever sees a complete file.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ScoutError::persistence(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| {
            ScoutError::persistence(format!("failed to decode {}: {}", path.display(), e))
        })?;
        Ok(Some(value))
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let target = self.path(name);
        let tmp = self.path(&format!(".{}.{}.tmp", name, Uuid::new_v4()));

        let result = async {
            tokio::fs::create_dir_all(&self.root).await?;
            let json = serde_json::to_vec_pretty(value)?;
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &target).await?;
            Ok::<(), ScoutError>(())
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(ScoutError::persistence(format!(
                "failed to write {}: {}",
                target.display(),
                e
            )));
        }
        debug!("Wrote {}", target.display());
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
        let snapshot: Option<Snapshot> = self.read_json(SNAPSHOT_FILE).await?;
        if let Some(snapshot) = &snapshot {
            snapshot.verify()?;
        }
        Ok(snapshot)
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_json(SNAPSHOT_FILE, snapshot).await?;
        info!(
            "💾 Saved snapshot {} ({} offers) to {}",
            snapshot.id,
            snapshot.count,
            self.path(SNAPSHOT_FILE).display()
        );
        Ok(())
    }

    async fn load_stats(&self) -> Result<RunStats> {
        Ok(self.read_json(STATS_FILE).await?.unwrap_or_default())
    }

    async fn save_stats(&self, stats: &RunStats) -> Result<()> {
        self.write_json(STATS_FILE, stats).await
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read_json(HISTORY_FILE).await?.unwrap_or_default())
    }

    async fn save_history(&self, history: &[HistoryEntry]) -> Result<()> {
        self.write_json(HISTORY_FILE, history).await
    }
}
