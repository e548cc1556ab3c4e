/*!
Test doubles for the provider and prompt seams
*/

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use instagram_api::{
    AccountProvider, ApiError, BackupCode, FollowerSet, LoginOutcome, Session, TwoFactorChallenge,
};

use crate::core::prompt::Prompter;

pub fn set(handles: &[&str]) -> FollowerSet {
    handles.iter().map(|h| h.to_string()).collect()
}

pub fn session(username: &str) -> Session {
    let mut cookies = BTreeMap::new();
    cookies.insert("csrftoken".to_string(), "tok".to_string());
    cookies.insert("sessionid".to_string(), format!("{username}-session"));
    Session::new(username, cookies)
}

/// Provider with scripted answers. Unscripted logins succeed and unscripted
/// fetches return the current `steady` follower set.
#[derive(Default)]
pub struct FakeProvider {
    logins: Mutex<VecDeque<LoginOutcome>>,
    fetches: Mutex<VecDeque<Result<FollowerSet, ApiError>>>,
    steady: Mutex<FollowerSet>,
    backup: Mutex<Option<Result<Session, ApiError>>>,
    reject_sessions: AtomicBool,
    pub login_calls: AtomicUsize,
    pub backup_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_followers(self, handles: &[&str]) -> Self {
        self.set_followers(handles);
        self
    }

    pub fn then_fetch(self, result: Result<FollowerSet, ApiError>) -> Self {
        self.fetches.lock().unwrap().push_back(result);
        self
    }

    pub fn then_login(self, outcome: LoginOutcome) -> Self {
        self.logins.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_backup_result(self, result: Result<Session, ApiError>) -> Self {
        *self.backup.lock().unwrap() = Some(result);
        self
    }

    pub fn rejecting_sessions(self) -> Self {
        self.reject_sessions.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_followers(&self, handles: &[&str]) {
        *self.steady.lock().unwrap() = set(handles);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountProvider for FakeProvider {
    async fn login(&self, username: &str, _password: &str) -> LoginOutcome {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.logins
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| LoginOutcome::Success(session(username)))
    }

    async fn submit_backup_code(
        &self,
        challenge: &TwoFactorChallenge,
        _code: &BackupCode,
    ) -> Result<Session, ApiError> {
        self.backup_calls.fetch_add(1, Ordering::SeqCst);
        self.backup
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(session(&challenge.username)))
    }

    async fn validate_session(&self, _session: &Session) -> Result<(), ApiError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_sessions.load(Ordering::SeqCst) {
            return Err(ApiError::LoginRequired);
        }
        Ok(())
    }

    async fn followers(&self, _session: &Session, _username: &str) -> Result<FollowerSet, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.fetches.lock().unwrap().pop_front() {
            return result;
        }
        Ok(self.steady.lock().unwrap().clone())
    }
}

/// Prompter that replays canned answers and records the questions asked
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    fn next(&self, prompt: &str) -> io::Result<String> {
        self.asked.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer"))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str) -> io::Result<String> {
        self.next(prompt)
    }

    fn secret(&self, prompt: &str) -> io::Result<String> {
        self.next(prompt)
    }
}
