/*!
Session artifact persistence, so restarts can skip the interactive login
*/

use std::path::{Path, PathBuf};

use instagram_api::Session;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::snapshot_store::StoreError;

pub struct SessionStore {
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionLoadError {
    #[error("{source}")]
    Read {
        #[from]
        source: StoreError,
    },

    #[error("unreadable session file: {source}")]
    Corrupt { source: serde_json::Error },
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no session has been saved yet
    pub async fn load(&self) -> Result<Option<Session>, SessionLoadError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path)(e).into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SessionLoadError::Corrupt { source })
    }

    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(session)
            .map_err(|source| StoreError::Serialize { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io(parent))?;
        }

        // The cookies are as good as a password: create the file owner-only
        // and rename it into place so it is never readable by others.
        let tmp_path = self.path.with_extension("tmp");
        match fs::remove_file(&tmp_path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(StoreError::io(&tmp_path)(e));
            }
            _ => {}
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&tmp_path)
            .await
            .map_err(StoreError::io(&tmp_path))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(StoreError::io(&tmp_path))?;
        file.sync_all().await.map_err(StoreError::io(&tmp_path))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(StoreError::io(&self.path))?;

        debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Delete the stored session. A missing file is not an error.
    pub async fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path)(e)),
        }
    }
}
