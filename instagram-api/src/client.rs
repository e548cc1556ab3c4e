/*!
HTTP implementation of [`AccountProvider`] against the Instagram web API
*/

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{COOKIE, HeaderMap, REFERER, SET_COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    error::ApiError,
    provider::{AccountProvider, LoginOutcome},
    session::{FollowerSet, Session, cookie_header},
    two_factor::{BackupCode, TwoFactorChallenge},
};

const LOGIN_PATH: &str = "/api/v1/web/accounts/login/ajax/";
const TWO_FACTOR_PATH: &str = "/api/v1/web/accounts/login/ajax/two_factor/";
const CURRENT_USER_PATH: &str = "/api/v1/accounts/current_user/";
const PROFILE_INFO_PATH: &str = "/api/v1/users/web_profile_info/";

/// Public app id the web client sends with every API call.
const WEB_APP_ID: &str = "936619743392459";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host every API path is appended to
    pub base_url: String,
    pub user_agent: String,
    /// Followers requested per page
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/537.36 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/537.36".to_string(),
            page_size: 50,
        }
    }
}

pub struct InstagramClient {
    config: ClientConfig,
    client: Client,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginReply {
    authenticated: bool,
    user: Option<bool>,
    two_factor_required: bool,
    two_factor_info: Option<TwoFactorInfo>,
    checkpoint_url: Option<String>,
    status: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwoFactorInfo {
    two_factor_identifier: String,
}

#[derive(Debug, Deserialize)]
struct ProfileInfo {
    data: ProfileData,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user: Option<ProfileUser>,
}

#[derive(Debug, Deserialize)]
struct ProfileUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FollowersPage {
    #[serde(default)]
    users: Vec<FollowerEntry>,
    next_max_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FollowerEntry {
    username: String,
}

impl InstagramClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn with_cookies(
        &self,
        request: RequestBuilder,
        cookies: &BTreeMap<String, String>,
    ) -> RequestBuilder {
        let mut request = request
            .header(COOKIE, cookie_header(cookies))
            .header("X-IG-App-ID", WEB_APP_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(REFERER, self.url("/"));
        if let Some(token) = cookies.get("csrftoken") {
            request = request.header("X-CSRFToken", token);
        }
        request
    }

    /// The landing page hands out the csrftoken cookie a login POST requires.
    async fn fetch_login_cookies(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let response = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .map_err(|source| ApiError::RequestSend { source })?;

        let cookies = collect_set_cookies(response.headers());
        if !cookies.contains_key("csrftoken") {
            return Err(ApiError::MissingCsrfToken);
        }
        Ok(cookies)
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let mut cookies = self.fetch_login_cookies().await?;
        let enc_password = format!(
            "#PWD_INSTAGRAM_BROWSER:0:{}:{}",
            Utc::now().timestamp(),
            password
        );

        let request = self.client.post(self.url(LOGIN_PATH)).form(&[
            ("username", username),
            ("enc_password", enc_password.as_str()),
            ("queryParams", "{}"),
            ("optIntoOneTap", "false"),
        ]);
        let response = self
            .with_cookies(request, &cookies)
            .send()
            .await
            .map_err(|source| ApiError::RequestSend { source })?;

        cookies.extend(collect_set_cookies(response.headers()));
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::ResponseRead { source })?;

        // Rejected logins still come back as JSON, usually with a 400.
        let reply: LoginReply = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => return Err(ApiError::Status { status, body }),
            Err(source) => return Err(ApiError::Decode { source }),
        };
        debug!("Login reply for {}: {:?}", username, reply);

        Ok(interpret_login(username, reply, cookies))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path)).query(query);
        let response = self
            .with_cookies(request, &session.cookies)
            .send()
            .await
            .map_err(|source| ApiError::RequestSend { source })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::LoginRequired);
        }

        let body = response
            .text()
            .await
            .map_err(|source| ApiError::ResponseRead { source })?;

        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => return Err(ApiError::Status { status, body }),
            Err(source) => return Err(ApiError::Decode { source }),
        };

        if value.get("message").and_then(|m| m.as_str()) == Some("login_required") {
            return Err(ApiError::LoginRequired);
        }
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        serde_json::from_value(value).map_err(|source| ApiError::Decode { source })
    }

    async fn resolve_user_id(&self, session: &Session, username: &str) -> Result<String, ApiError> {
        let info: ProfileInfo = self
            .get_json(session, PROFILE_INFO_PATH, &[("username", username.to_string())])
            .await
            .map_err(|e| match e {
                ApiError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                    ApiError::UserNotFound {
                        username: username.to_string(),
                    }
                }
                other => other,
            })?;

        info.data
            .user
            .map(|user| user.id)
            .ok_or_else(|| ApiError::UserNotFound {
                username: username.to_string(),
            })
    }
}

fn interpret_login(
    username: &str,
    reply: LoginReply,
    cookies: BTreeMap<String, String>,
) -> LoginOutcome {
    if reply.two_factor_required {
        return match reply.two_factor_info {
            Some(info) => LoginOutcome::NeedsSecondFactor(TwoFactorChallenge::new(
                username,
                info.two_factor_identifier,
                cookies,
            )),
            None => LoginOutcome::Failure("two-factor required but no identifier given".to_string()),
        };
    }

    if reply.authenticated {
        return LoginOutcome::Success(Session::new(username, cookies));
    }

    if let Some(url) = reply.checkpoint_url {
        return LoginOutcome::Failure(format!("checkpoint required, verify the login at {url}"));
    }

    if reply.status.as_deref() == Some("fail") {
        return LoginOutcome::Failure(
            reply
                .message
                .unwrap_or_else(|| "login request failed".to_string()),
        );
    }

    if reply.user == Some(false) {
        return LoginOutcome::Failure(format!("user @{username} does not exist"));
    }

    // authenticated=false for a known user: wrong password
    LoginOutcome::InvalidCredentials
}

/// Name/value pairs from every `Set-Cookie` header, ignoring attributes and
/// cookies that are being cleared.
fn collect_set_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| {
            let pair = raw.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            let value = value.trim().trim_matches('"');
            if value.is_empty() {
                return None;
            }
            Some((name.trim().to_string(), value.to_string()))
        })
        .collect()
}

fn page_cursor(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl AccountProvider for InstagramClient {
    async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        debug!("Logging in as {}", username);
        match self.try_login(username, password).await {
            Ok(outcome) => outcome,
            Err(e) => LoginOutcome::Failure(e.to_string()),
        }
    }

    async fn submit_backup_code(
        &self,
        challenge: &TwoFactorChallenge,
        code: &BackupCode,
    ) -> Result<Session, ApiError> {
        let request = self.client.post(self.url(TWO_FACTOR_PATH)).form(&[
            ("username", challenge.username.as_str()),
            ("verificationCode", code.as_str()),
            ("identifier", challenge.identifier.as_str()),
            ("trust_signal", "true"),
        ]);
        let response = self
            .with_cookies(request, &challenge.cookies)
            .send()
            .await
            .map_err(|source| ApiError::RequestSend { source })?;

        let mut cookies = challenge.cookies.clone();
        cookies.extend(collect_set_cookies(response.headers()));
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::ResponseRead { source })?;

        let reply: LoginReply = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => return Err(ApiError::Status { status, body }),
            Err(source) => return Err(ApiError::Decode { source }),
        };

        if reply.status.as_deref() == Some("fail") || !reply.authenticated {
            return Err(ApiError::TwoFactorRejected {
                reason: reply
                    .message
                    .unwrap_or_else(|| "not authenticated".to_string()),
            });
        }

        Ok(Session::new(challenge.username.clone(), cookies))
    }

    async fn validate_session(&self, session: &Session) -> Result<(), ApiError> {
        if session.cookie("sessionid").is_none() {
            return Err(ApiError::LoginRequired);
        }

        let reply: serde_json::Value = self
            .get_json(session, CURRENT_USER_PATH, &[("edit", "true".to_string())])
            .await?;
        if reply.get("user").is_none_or(|user| user.is_null()) {
            return Err(ApiError::LoginRequired);
        }
        Ok(())
    }

    async fn followers(&self, session: &Session, username: &str) -> Result<FollowerSet, ApiError> {
        let user_id = self.resolve_user_id(session, username).await?;
        let path = format!("/api/v1/friendships/{user_id}/followers/");

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner.set_message(format!("Fetching followers of @{username}"));

        let mut followers = FollowerSet::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();
        let mut pages = 0u32;

        let result = loop {
            let mut query = vec![("count", self.config.page_size.to_string())];
            if let Some(ref max_id) = cursor {
                query.push(("max_id", max_id.clone()));
            }

            let page: FollowersPage = match self.get_json(session, &path, &query).await {
                Ok(page) => page,
                Err(e) => break Err(e),
            };
            pages += 1;
            followers.extend(page.users.into_iter().map(|u| u.username));
            spinner.set_message(format!("{} followers of @{username}", followers.len()));

            match page.next_max_id.and_then(page_cursor) {
                // A revisited cursor means the listing would never end and may be incomplete.
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    warn!("⚠️ Follower paging revisited cursor {} after {} pages", next, pages);
                    break Err(ApiError::CursorLoop { cursor: next });
                }
                Some(next) => cursor = Some(next),
                None => break Ok(()),
            }
        };

        spinner.finish_and_clear();
        result?;

        debug!("Fetched {} followers in {} pages", followers.len(), pages);
        Ok(followers)
    }
}
