// src/session.rs
// Process-wide session state: a holder with subscribe/unsubscribe lifecycle
// plus a password-grant sign-in client against a GoTrue-style auth endpoint.
// The query controller only needs "a valid session exists"; it never manages
// authentication itself.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("network error: {0}")]
    Network(String),

    #[error("auth error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

pub type SubscriptionId = u64;

type SessionCallback = Box<dyn Fn(Option<&Session>) + Send + 'static>;

#[derive(Default)]
struct HolderInner {
    current: Option<Session>,
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, SessionCallback)>,
}

/// Owner of the current session. Created once at startup, shared via `Arc`,
/// dropped at shutdown. Subscribers are notified on every change.
#[derive(Default)]
pub struct SessionHolder {
    inner: Mutex<HolderInner>,
}

impl SessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.lock().expect("session mutex poisoned").current.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner
            .lock()
            .expect("session mutex poisoned")
            .current
            .is_some()
    }

    /// Install (or clear, with `None`) the current session and notify
    /// subscribers.
    pub fn set(&self, session: Option<Session>) {
        let mut inner = self.inner.lock().expect("session mutex poisoned");
        inner.current = session;
        let current = inner.current.clone();
        for (_, cb) in &inner.subscribers {
            cb(current.as_ref());
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Option<&Session>) + Send + 'static,
    {
        let mut inner = self.inner.lock().expect("session mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` when the id was not (or no longer) registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().expect("session mutex poisoned");
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }
}

#[async_trait]
pub trait PasswordAuth: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
}

/// Password-grant client for a GoTrue auth endpoint (Supabase auth).
#[derive(Clone)]
pub struct GotrueAuth {
    base: String,
    api_key: String,
    client: Client,
    timeout: Duration,
}

impl GotrueAuth {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl PasswordAuth for GotrueAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base);
        let resp = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 400 || status.as_u16() == 401 {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + TimeDelta::seconds(secs));
        Ok(Session {
            access_token: token.access_token,
            user_email: token.user.and_then(|u| u.email),
            expires_at,
        })
    }
}
