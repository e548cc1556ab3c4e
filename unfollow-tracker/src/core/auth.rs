/*!
Authentication: stored-session reuse, password login and the backup-code
second factor
*/

use std::sync::Arc;

use instagram_api::{
    AccountProvider, ApiError, BackupCode, BackupCodeError, LoginOutcome, Session,
    TwoFactorChallenge,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::{
    prompt::Prompter,
    session_store::SessionStore,
    snapshot_store::StoreError,
};

pub const USERNAME_ENV: &str = "INSTAGRAM_USER";
pub const PASSWORD_ENV: &str = "INSTAGRAM_PASS";

/// Where the tracker stands with the provider
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Session),
    /// The provider stopped accepting the session; log in again before the next fetch
    Expired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials. Check your username and password.")]
    InvalidCredentials,

    #[error("No username given.")]
    EmptyUsername,

    #[error("Login failed: {reason}")]
    LoginFailed { reason: String },

    #[error("Invalid backup code format: {source}")]
    MalformedBackupCode {
        #[from]
        source: BackupCodeError,
    },

    #[error("Backup code failed: {source}")]
    BackupCodeRejected { source: ApiError },

    #[error("Prompt: {source}")]
    Prompt { source: std::io::Error },

    #[error("Could not save session: {source}")]
    SessionSave { source: StoreError },
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Username from the given value, then INSTAGRAM_USER, then a prompt
pub fn resolve_username(
    configured: Option<String>,
    prompter: &dyn Prompter,
) -> Result<String, AuthError> {
    if let Some(username) = configured
        .filter(|u| !u.trim().is_empty())
        .or_else(|| non_empty_env(USERNAME_ENV))
    {
        return Ok(username.trim().to_string());
    }
    let username = prompter
        .input("👤 Enter Instagram Username")
        .map_err(|source| AuthError::Prompt { source })?;
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::EmptyUsername);
    }
    Ok(username.to_string())
}

pub fn password_from_env() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}

pub struct Authenticator {
    username: String,
    password: Option<String>,
    store: SessionStore,
    prompter: Arc<dyn Prompter>,
}

impl Authenticator {
    /// `password` is asked for only when a fresh login is needed and it is `None`
    pub fn new(
        username: impl Into<String>,
        password: Option<String>,
        store: SessionStore,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            username: username.into(),
            password,
            store,
            prompter,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Reuse the stored session if the provider still accepts it, otherwise
    /// log in and store the new session.
    pub async fn authenticate(&self, provider: &dyn AccountProvider) -> Result<Session, AuthError> {
        if let Some(session) = self.restore(provider).await {
            return Ok(session);
        }

        info!("🔑 Attempting login...");
        let password = match &self.password {
            Some(password) => password.clone(),
            None => self
                .prompter
                .secret("🔑 Enter Instagram Password")
                .map_err(|source| AuthError::Prompt { source })?,
        };

        match provider.login(&self.username, &password).await {
            LoginOutcome::Success(session) => {
                self.persist(&session).await?;
                info!("✅ Login successful. Session saved.");
                Ok(session)
            }
            LoginOutcome::NeedsSecondFactor(challenge) => {
                self.backup_code_login(provider, &challenge).await
            }
            LoginOutcome::InvalidCredentials => Err(AuthError::InvalidCredentials),
            LoginOutcome::Failure(reason) => Err(AuthError::LoginFailed { reason }),
        }
    }

    /// Forget the stored session so the next `authenticate` logs in afresh
    pub async fn discard(&self) {
        if let Err(e) = self.store.remove().await {
            warn!("⚠️ Could not remove session file: {}", e);
        }
    }

    async fn restore(&self, provider: &dyn AccountProvider) -> Option<Session> {
        let session = match self.store.load().await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                warn!("⚠️ Session error: {}. Removing session file.", e);
                self.discard().await;
                return None;
            }
        };

        if session.username != self.username {
            warn!(
                "⚠️ Session file belongs to @{}, not @{}. Removing session file.",
                session.username, self.username
            );
            self.discard().await;
            return None;
        }

        match provider.validate_session(&session).await {
            Ok(()) => {
                info!("✅ Session loaded successfully. Skipping login.");
                Some(session)
            }
            Err(e) => {
                warn!("⚠️ Session error: {}. Removing session file.", e);
                self.discard().await;
                None
            }
        }
    }

    async fn backup_code_login(
        &self,
        provider: &dyn AccountProvider,
        challenge: &TwoFactorChallenge,
    ) -> Result<Session, AuthError> {
        println!("\n🔒 2FA REQUIRED! Instagram is asking for an 8-digit backup code.");
        println!(
            "📢 Go to Instagram App → Settings → Security → Two-Factor Authentication → Backup Codes"
        );

        let input = self
            .prompter
            .input("🆘 Enter your 8-digit backup code")
            .map_err(|source| AuthError::Prompt { source })?;
        let code = BackupCode::parse(&input)?;

        let session = provider
            .submit_backup_code(challenge, &code)
            .await
            .map_err(|source| {
                warn!("➡️ If login keeps failing, log in to Instagram manually and approve new login requests.");
                AuthError::BackupCodeRejected { source }
            })?;

        self.persist(&session).await?;
        info!("✅ Backup code accepted. Session saved.");
        Ok(session)
    }

    async fn persist(&self, session: &Session) -> Result<(), AuthError> {
        self.store
            .save(session)
            .await
            .map_err(|source| AuthError::SessionSave { source })
    }
}
