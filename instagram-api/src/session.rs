/*!
Session artifact and follower set shared by the provider and its callers
*/

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handles of the accounts following the tracked account.
pub type FollowerSet = BTreeSet<String>;

/// Authenticated session: the cookies the web API handed out at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub cookies: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>, cookies: BTreeMap<String, String>) -> Self {
        Self {
            username: username.into(),
            cookies,
            created_at: Utc::now(),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.cookie("csrftoken")
    }

    /// Value for a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        cookie_header(&self.cookies)
    }
}

pub(crate) fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
