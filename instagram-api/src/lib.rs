/*!
Client for the parts of the Instagram web API needed to track followers:
logging in (including the backup-code second factor), validating a stored
session, and listing an account's followers.
*/

pub mod client;
pub mod error;
pub mod provider;
pub mod session;
pub mod two_factor;

pub use client::{ClientConfig, InstagramClient};
pub use error::ApiError;
pub use provider::{AccountProvider, LoginOutcome};
pub use reqwest::StatusCode;
pub use session::{FollowerSet, Session};
pub use two_factor::{BackupCode, BackupCodeError, TwoFactorChallenge};
