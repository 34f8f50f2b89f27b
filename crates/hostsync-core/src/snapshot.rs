// # Snapshot Cache
//
// File-backed cache of the last router snapshot.
//
// ## Purpose
//
// Keeps a local copy of the most recent known-hosts table so a run can be
// replayed against IPAM without querying the router (`HostSource`
// implementation), and so operators can inspect what the router reported.
//
// ## Crash Safety
//
// - Atomic writes: new snapshot written to a `.tmp` file, then renamed
// - Backup: previous snapshot kept in a `.backup` file
// - Recovery: falls back to the backup when the main file is corrupt
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "fetched_at": "2025-06-01T12:00:00Z",
//   "hosts": [
//     { "status": true, "ip": "10.0.0.10", "mac": "AA:BB:CC:DD:EE:FF", "name": "printer" }
//   ]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::host::HostRecord;
use crate::traits::HostSource;

/// Snapshot file format version
const SNAPSHOT_FILE_VERSION: &str = "1.0";

/// A router snapshot with its fetch timestamp
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HostSnapshot {
    /// File format version
    pub version: String,

    /// When the snapshot was taken from the router
    pub fetched_at: chrono::DateTime<chrono::Utc>,

    /// The known-hosts table, in router order
    pub hosts: Vec<HostRecord>,
}

impl HostSnapshot {
    /// Wrap a freshly fetched host list, stamped now
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        Self {
            version: SNAPSHOT_FILE_VERSION.to_string(),
            fetched_at: chrono::Utc::now(),
            hosts,
        }
    }
}

/// File-backed snapshot cache
///
/// Also usable as a [`HostSource`]: `get_hosts` loads the cached table, so
/// a sync can run offline against the last snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Create a cache handle for the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Persist a snapshot atomically, keeping the previous file as backup
    pub async fn store(&self, snapshot: &HostSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, self.backup_path()).await
        {
            tracing::warn!("failed to back up previous snapshot: {}", e);
        }

        fs::rename(&temp_path, &self.path).await?;
        tracing::debug!(path = %self.path.display(), hosts = snapshot.hosts.len(), "snapshot cached");
        Ok(())
    }

    /// Load the cached snapshot, recovering from the backup on corruption
    pub async fn load(&self) -> Result<HostSnapshot> {
        match Self::load_file(&self.path).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e @ Error::Json(_)) => {
                tracing::warn!("snapshot file corrupt ({}), trying backup", e);
                Self::load_file(&self.backup_path()).await
            }
            Err(e) => Err(e),
        }
    }

    async fn load_file(path: &Path) -> Result<HostSnapshot> {
        let content = fs::read_to_string(path).await?;
        let snapshot: HostSnapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_FILE_VERSION {
            tracing::warn!(
                "snapshot version mismatch: expected {}, got {}",
                SNAPSHOT_FILE_VERSION,
                snapshot.version
            );
        }
        Ok(snapshot)
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(&self) -> PathBuf {
        let mut backup = self.path.clone();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl HostSource for SnapshotFile {
    async fn get_hosts(&self) -> Result<Vec<HostRecord>> {
        let snapshot = self.load().await?;
        tracing::info!(
            fetched_at = %snapshot.fetched_at,
            hosts = snapshot.hosts.len(),
            "loaded hosts from snapshot cache"
        );
        Ok(snapshot.hosts)
    }

    fn source_name(&self) -> &'static str {
        "snapshot"
    }
}
