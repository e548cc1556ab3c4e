/*!
Account-data provider abstraction the tracker depends on
*/

use async_trait::async_trait;

use crate::{
    error::ApiError,
    session::{FollowerSet, Session},
    two_factor::{BackupCode, TwoFactorChallenge},
};

/// Result of a password login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    Success(Session),
    NeedsSecondFactor(TwoFactorChallenge),
    InvalidCredentials,
    Failure(String),
}

/// Trait for services that can authenticate an account and list its followers
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Log in with a username and password
    async fn login(&self, username: &str, password: &str) -> LoginOutcome;

    /// Complete a pending second-factor login with a backup code
    async fn submit_backup_code(
        &self,
        challenge: &TwoFactorChallenge,
        code: &BackupCode,
    ) -> Result<Session, ApiError>;

    /// Check that a previously stored session is still accepted
    async fn validate_session(&self, session: &Session) -> Result<(), ApiError>;

    /// Fetch the handles currently following `username`
    async fn followers(&self, session: &Session, username: &str) -> Result<FollowerSet, ApiError>;
}
