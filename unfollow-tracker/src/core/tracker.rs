/*!
Polling loop that runs a follower check on a fixed interval until cancelled
*/

use std::io::{self, Write};
use std::time::Duration;

use instagram_api::{AccountProvider, Session};
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::{
    auth::{AuthError, Authenticator, SessionState},
    diff_engine::{CheckOutcome, DiffEngine},
    output::TerminalReporter,
};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{source}")]
    Auth {
        #[from]
        source: AuthError,
    },

    #[error("Output: {source}")]
    Output {
        #[from]
        source: io::Error,
    },
}

/// Main tracker that owns the provider and runs checks
pub struct UnfollowTracker<P: AccountProvider, W: Write = io::Stdout> {
    provider: P,
    authenticator: Authenticator,
    engine: DiffEngine,
    reporter: TerminalReporter<W>,
    interval: Duration,
    state: SessionState,
}

impl<P: AccountProvider, W: Write> UnfollowTracker<P, W> {
    pub fn new(
        provider: P,
        authenticator: Authenticator,
        engine: DiffEngine,
        reporter: TerminalReporter<W>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            authenticator,
            engine,
            reporter,
            interval,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn reporter(&self) -> &TerminalReporter<W> {
        &self.reporter
    }

    /// Return the current session, logging in first if there is none or it expired
    pub async fn authenticate(&mut self) -> Result<Session, AuthError> {
        match &self.state {
            SessionState::Authenticated(session) => return Ok(session.clone()),
            SessionState::Expired => {
                info!("🔄 Session expired, logging in again");
                self.authenticator.discard().await;
            }
            SessionState::Unauthenticated => {}
        }

        let session = self.authenticator.authenticate(&self.provider).await?;
        self.state = SessionState::Authenticated(session.clone());
        Ok(session)
    }

    /// One check: authenticate if needed, diff, print the report
    pub async fn run_cycle(&mut self) -> Result<(), TrackerError> {
        let session = self.authenticate().await?;

        match self.engine.check_unfollowers(&self.provider, &session).await {
            Ok(outcome) => {
                if let CheckOutcome::FetchFailed { error, .. } = &outcome {
                    if error.is_login_required() {
                        warn!("⚠️ Session for @{} is no longer accepted", self.authenticator.username());
                        self.state = SessionState::Expired;
                    }
                }
                self.reporter.report(&outcome)?;
            }
            Err(e) => {
                error!("❌ Could not save follower snapshot: {}", e);
            }
        }
        Ok(())
    }

    /// Run checks until `shutdown` is cancelled or `max_cycles` checks have
    /// completed. Returns the number of completed checks.
    pub async fn run(
        &mut self,
        shutdown: CancellationToken,
        max_cycles: Option<u64>,
    ) -> Result<u64, TrackerError> {
        info!(
            "🚀 Tracking followers of @{} every {:?}",
            self.authenticator.username(),
            self.interval
        );

        let mut cycles = 0u64;
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.run_cycle() => result?,
            }
            cycles += 1;

            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            self.reporter.waiting(self.interval)?;
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!("🏁 Tracker stopped after {} checks", cycles);
        Ok(cycles)
    }
}
