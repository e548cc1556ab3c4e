/*!
Persistent follower snapshot: the last successfully fetched follower set
*/

use std::path::{Path, PathBuf};

use chrono::Utc;
use instagram_api::FollowerSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// On-disk form of a snapshot. Follower order is not meaningful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// ISO-8601 time of the fetch this snapshot records
    pub timestamp: String,
    pub followers: Vec<String>,
}

impl Snapshot {
    pub fn new(followers: &FollowerSet) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            followers: followers.iter().cloned().collect(),
        }
    }

    pub fn follower_set(&self) -> FollowerSet {
        self.followers.iter().cloned().collect()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialize: {source}")]
    Serialize { source: serde_json::Error },
}

impl StoreError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Single-writer store for the follower snapshot file
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot. Missing, unreadable and corrupt files all
    /// mean "no prior data".
    pub async fn load_snapshot(&self) -> Option<Snapshot> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {:?}", self.path);
                return None;
            }
            Err(e) => {
                warn!("⚠️ Could not read snapshot {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("⚠️ Ignoring corrupt snapshot {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Previously saved followers, empty when there is no usable snapshot
    pub async fn load(&self) -> FollowerSet {
        self.load_snapshot()
            .await
            .map(|snapshot| snapshot.follower_set())
            .unwrap_or_default()
    }

    /// Replace the snapshot with `followers`, stamped with the current time
    pub async fn save(&self, followers: &FollowerSet) -> Result<Snapshot, StoreError> {
        let snapshot = Snapshot::new(followers);
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|source| StoreError::Serialize { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io(parent))?;
        }

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .await
            .map_err(StoreError::io(&tmp_path))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(StoreError::io(&self.path))?;

        debug!("Saved {} followers to {:?}", followers.len(), self.path);
        Ok(snapshot)
    }
}
