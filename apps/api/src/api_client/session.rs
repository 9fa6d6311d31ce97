use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Tokens issued by the remote auth endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub username: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionTokens {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Body of `data` returned by `/auth/login` and `/auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Turns a grant into stored tokens. A refresh response that omits the
    /// refresh token keeps the previous one.
    pub fn into_tokens(self, now: DateTime<Utc>, previous: Option<&SessionTokens>) -> SessionTokens {
        SessionTokens {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            username: previous.and_then(|p| p.username.clone()),
            issued_at: now,
            expires_at: self
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// What the browser sees of the session; never includes tokens.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub username: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Holds the admin session for the API client. Passed in explicitly so tests
/// can start from any state.
#[derive(Debug, Default)]
pub struct SessionContext {
    tokens: RwLock<Option<SessionTokens>>,
    /// Held while the session is refreshed or re-established, so concurrent
    /// requests rejected with the same token recover it only once.
    recovery: Mutex<()>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: SessionTokens) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
            recovery: Mutex::new(()),
        }
    }

    pub async fn recovery_guard(&self) -> MutexGuard<'_, ()> {
        self.recovery.lock().await
    }

    pub async fn tokens(&self) -> Option<SessionTokens> {
        self.tokens.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.as_ref().map(|t| t.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }

    pub async fn store(&self, tokens: SessionTokens) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn clear(&self) {
        *self.tokens.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    pub async fn info(&self) -> SessionInfo {
        match self.tokens.read().await.as_ref() {
            Some(t) => SessionInfo {
                authenticated: true,
                username: t.username.clone(),
                issued_at: Some(t.issued_at),
                expires_at: t.expires_at,
            },
            None => SessionInfo {
                authenticated: false,
                username: None,
                issued_at: None,
                expires_at: None,
            },
        }
    }
}
