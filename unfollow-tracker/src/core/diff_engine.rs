/*!
Follower diffing: compare a fresh fetch against the stored snapshot
*/

use std::path::PathBuf;

use instagram_api::{AccountProvider, ApiError, FollowerSet, Session};
use tracing::{info, warn};

use crate::core::snapshot_store::{SnapshotStore, StoreError};

/// Handles in `previous` that are missing from `current`
pub fn diff(previous: &FollowerSet, current: &FollowerSet) -> FollowerSet {
    previous.difference(current).cloned().collect()
}

/// What one check found. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfollowerReport {
    pub previous_count: usize,
    pub current_count: usize,
    pub unfollowers: FollowerSet,
    pub new_followers: FollowerSet,
    /// No snapshot existed before this check
    pub first_run: bool,
    pub saved_to: PathBuf,
}

#[derive(Debug)]
pub enum CheckOutcome {
    Completed(UnfollowerReport),
    /// The fetch failed; the stored snapshot was left as it was.
    FetchFailed {
        previous_count: usize,
        error: ApiError,
    },
}

pub struct DiffEngine {
    account: String,
    store: SnapshotStore,
}

impl DiffEngine {
    pub fn new(account: impl Into<String>, store: SnapshotStore) -> Self {
        Self {
            account: account.into(),
            store,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub async fn fetch_current_followers(
        &self,
        provider: &dyn AccountProvider,
        session: &Session,
    ) -> Result<FollowerSet, ApiError> {
        provider
            .followers(session, &self.account)
            .await
            .inspect_err(|e| warn!("⚠️ ERROR fetching followers: {}", e))
    }

    /// Load the previous snapshot, fetch the current followers, and save them
    /// as the new snapshot. A failed fetch skips the save.
    pub async fn check_unfollowers(
        &self,
        provider: &dyn AccountProvider,
        session: &Session,
    ) -> Result<CheckOutcome, StoreError> {
        let previous = self.store.load_snapshot().await;
        let first_run = previous.is_none();
        let previous = previous
            .map(|snapshot| snapshot.follower_set())
            .unwrap_or_default();

        let current = match self.fetch_current_followers(provider, session).await {
            Ok(current) => current,
            Err(error) => {
                return Ok(CheckOutcome::FetchFailed {
                    previous_count: previous.len(),
                    error,
                });
            }
        };

        let unfollowers = diff(&previous, &current);
        let new_followers = if first_run {
            FollowerSet::new()
        } else {
            diff(&current, &previous)
        };

        self.store.save(&current).await?;
        info!(
            "🔍 @{}: {} followers, {} unfollowed, {} new",
            self.account,
            current.len(),
            unfollowers.len(),
            new_followers.len()
        );

        Ok(CheckOutcome::Completed(UnfollowerReport {
            previous_count: previous.len(),
            current_count: current.len(),
            unfollowers,
            new_followers,
            first_run,
            saved_to: self.store.path().to_path_buf(),
        }))
    }
}
