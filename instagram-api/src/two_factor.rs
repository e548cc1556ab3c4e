/*!
Second-factor challenge state and backup-code validation
*/

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Pending second-factor login returned when the password was accepted but
/// a code is still required.
#[derive(Debug, Clone)]
pub struct TwoFactorChallenge {
    pub username: String,
    pub identifier: String,
    pub(crate) cookies: BTreeMap<String, String>,
}

impl TwoFactorChallenge {
    pub fn new(
        username: impl Into<String>,
        identifier: impl Into<String>,
        cookies: BTreeMap<String, String>,
    ) -> Self {
        Self {
            username: username.into(),
            identifier: identifier.into(),
            cookies,
        }
    }
}

pub const BACKUP_CODE_LEN: usize = 8;

/// An eight-digit backup code. Only constructible through [`BackupCode::parse`].
#[derive(Clone, PartialEq, Eq)]
pub struct BackupCode(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackupCodeError {
    #[error("backup code must be exactly 8 digits, got {0}")]
    WrongLength(usize),

    #[error("backup code must contain only digits")]
    NonDigit,
}

impl BackupCode {
    pub fn parse(input: &str) -> Result<Self, BackupCodeError> {
        let code = input.trim();
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(BackupCodeError::NonDigit);
        }
        if code.len() != BACKUP_CODE_LEN {
            return Err(BackupCodeError::WrongLength(code.chars().count()));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep the code out of logs.
impl fmt::Debug for BackupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BackupCode(********)")
    }
}
