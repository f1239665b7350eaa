// Snapshot persistence: baseline snapshots, run statistics and run history

pub mod file;
pub mod in_memory;
pub mod models;
pub mod traits;

pub use file::FileStore;
pub use in_memory::InMemoryStore;
pub use models::{HistoryEntry, RunStats, SiteStats, Snapshot};
pub use traits::SnapshotStore;
