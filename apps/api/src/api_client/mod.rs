//! API client — the single point of entry for calls to the remote sekolah API.
//!
//! Every request goes through `execute`, which attaches the session bearer
//! token and, on a 401, recovers the session once before retrying.

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod envelope;
pub mod session;

pub use envelope::Envelope;
pub use session::{SessionContext, SessionInfo, TokenGrant};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API rejected request: {message}")]
    Rejected { message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
    credentials: Option<(String, String)>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionContext>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            credentials: None,
        }
    }

    /// Service credentials used to log in again when the session cannot be refreshed.
    pub fn with_credentials(mut self, credentials: Option<(String, String)>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Logs in with admin credentials and stores the issued tokens.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionInfo, ApiError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let grant: TokenGrant = read_envelope(response, "/auth/login").await?.into_item()?;
        let mut tokens = grant.into_tokens(chrono::Utc::now(), None);
        tokens.username = Some(username.to_string());
        self.session.store(tokens).await;

        info!("Logged in to remote API as {username}");
        Ok(self.session.info().await)
    }

    /// Exchanges the stored refresh token for a new access token.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let previous = self.session.tokens().await;
        let refresh_token = previous
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or(ApiError::Unauthorized)?;

        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let grant: TokenGrant = read_envelope(response, "/auth/refresh").await?.into_item()?;
        self.session
            .store(grant.into_tokens(chrono::Utc::now(), previous.as_ref()))
            .await;

        debug!("Access token refreshed");
        Ok(())
    }

    pub async fn logout(&self) {
        self.session.clear().await;
        info!("Session cleared");
    }

    /// Sends a request with the auth interceptor applied and unwraps the envelope.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Envelope, ApiError> {
        self.refresh_if_expired().await;

        let sent = self.session.access_token().await;
        let response = self
            .send_once(method.clone(), path, query, body, sent.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_envelope(response, path).await;
        }

        warn!("Remote API returned 401 for {method} {path}; recovering session");
        self.recover_session(sent.as_deref()).await?;

        let token = self.session.access_token().await;
        let retry = self
            .send_once(method, path, query, body, token.as_deref())
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            self.session.clear().await;
            return Err(ApiError::Unauthorized);
        }
        read_envelope(retry, path).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut request = self.client.request(method, self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn refresh_if_expired(&self) {
        let needs_refresh = |tokens: Option<session::SessionTokens>| {
            tokens.map_or(false, |t| {
                t.is_expired(chrono::Utc::now()) && t.refresh_token.is_some()
            })
        };
        if !needs_refresh(self.session.tokens().await) {
            return;
        }

        let _guard = self.session.recovery_guard().await;
        // Another request may have refreshed while this one waited
        if !needs_refresh(self.session.tokens().await) {
            return;
        }
        if let Err(e) = self.refresh().await {
            debug!("Proactive refresh failed: {e}");
        }
    }

    /// Refresh first, then fall back to the configured service credentials.
    /// Leaves the session cleared when neither works. `rejected` is the token
    /// the 401 came back for; if the session already holds a different one,
    /// a concurrent request recovered it and nothing is sent.
    async fn recover_session(&self, rejected: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.session.recovery_guard().await;

        if let Some(current) = self.session.access_token().await {
            if rejected != Some(current.as_str()) {
                debug!("Session already recovered by a concurrent request");
                return Ok(());
            }
        }

        if self.session.refresh_token().await.is_some() {
            match self.refresh().await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Token refresh failed: {e}"),
            }
        }

        if let Some((username, password)) = &self.credentials {
            match self.login(username, password).await {
                Ok(_) => return Ok(()),
                Err(e) => warn!("Re-login with service credentials failed: {e}"),
            }
        }

        self.session.clear().await;
        Err(ApiError::Unauthorized)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        Ok(self.execute(Method::GET, path, query, None).await?.into_list())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Ok(self.execute(Method::GET, path, &[], None).await?.into_item()?)
    }

    pub async fn create<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        Ok(self.execute(Method::POST, path, &[], Some(&body)).await?.data)
    }

    pub async fn update<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        Ok(self.execute(Method::PUT, path, &[], Some(&body)).await?.data)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}

async fn read_envelope(response: Response, path: &str) -> Result<Envelope, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(path.to_string()));
    }

    let body = response.text().await?;

    if !status.is_success() {
        // Try to pull the API's own message out of the envelope
        let message = serde_json::from_str::<Envelope>(&body)
            .ok()
            .and_then(|e| e.message())
            .unwrap_or(body);
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: Envelope = if body.trim().is_empty() {
        Envelope::default()
    } else {
        serde_json::from_str(&body)?
    };

    if !envelope.is_success() {
        return Err(ApiError::Rejected {
            message: envelope
                .message()
                .unwrap_or_else(|| format!("non-success status from {path}")),
        });
    }

    Ok(envelope)
}

/// Percent-encodes one path segment (occupation codes may contain `/` or spaces).
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn spawn_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::session::SessionTokens;
    use axum::{
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn session_with(access: &str, refresh: Option<&str>) -> Arc<SessionContext> {
        Arc::new(SessionContext::with_tokens(SessionTokens {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            username: Some("admin".to_string()),
            issued_at: chrono::Utc::now(),
            expires_at: None,
        }))
    }

    /// Upstream whose `/okupasi` only accepts `Bearer t2`, and whose refresh
    /// endpoint issues `t2` and counts its calls.
    fn t2_upstream(refreshes: Arc<AtomicUsize>, rejected: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/okupasi",
                get(move |headers: HeaderMap| {
                    let rejected = rejected.clone();
                    async move {
                        if bearer(&headers).as_deref() == Some("Bearer t2") {
                            (AxumStatus::OK, Json(json!({ "status": true, "data": [] })))
                        } else {
                            rejected.fetch_add(1, Ordering::SeqCst);
                            (AxumStatus::UNAUTHORIZED, Json(json!({ "status": false })))
                        }
                    }
                }),
            )
            .route(
                "/auth/refresh",
                post(move || {
                    let refreshes = refreshes.clone();
                    async move {
                        refreshes.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Json(json!({ "status": true, "data": { "access_token": "t2" } }))
                    }
                }),
            )
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("1234"), "1234");
        assert_eq!(encode_segment("TIK/01 A"), "TIK%2F01%20A");
        assert_eq!(encode_segment("Boga&Kue?"), "Boga%26Kue%3F");
    }

    #[tokio::test]
    async fn test_list_sends_bearer_and_decodes() {
        let router = Router::new().route(
            "/okupasi",
            get(|headers: HeaderMap| async move {
                if bearer(&headers).as_deref() != Some("Bearer t1") {
                    return (AxumStatus::UNAUTHORIZED, Json(json!({ "status": false })));
                }
                (
                    AxumStatus::OK,
                    Json(json!({ "status": true, "data": [{ "kode": "1234", "nama": "Teknisi" }] })),
                )
            }),
        );
        let base = spawn_upstream(router).await;
        let client = ApiClient::new(base, session_with("t1", None));

        let list: Vec<crate::models::Okupasi> = client.list("/okupasi", &[]).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].nama, "Teknisi");
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = refreshes.clone();
        let router = Router::new()
            .route(
                "/okupasi",
                get(|headers: HeaderMap| async move {
                    if bearer(&headers).as_deref() == Some("Bearer t2") {
                        (AxumStatus::OK, Json(json!({ "status": true, "data": [] })))
                    } else {
                        (AxumStatus::UNAUTHORIZED, Json(json!({ "status": false })))
                    }
                }),
            )
            .route(
                "/auth/refresh",
                post(move |Json(body): Json<Value>| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(body["refresh_token"], "r1");
                        Json(json!({ "status": true, "data": { "access_token": "t2" } }))
                    }
                }),
            );
        let base = spawn_upstream(router).await;
        let session = session_with("expired", Some("r1"));
        let client = ApiClient::new(base, session.clone());

        let list: Vec<Value> = client.list("/okupasi", &[]).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(session.access_token().await.as_deref(), Some("t2"));
        assert_eq!(session.refresh_token().await.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_before_first_request() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));
        let base = spawn_upstream(t2_upstream(refreshes.clone(), rejected.clone())).await;
        let session = Arc::new(SessionContext::with_tokens(SessionTokens {
            access_token: "t1".to_string(),
            refresh_token: Some("r1".to_string()),
            username: Some("admin".to_string()),
            issued_at: chrono::Utc::now() - chrono::Duration::hours(2),
            expires_at: Some(chrono::Utc::now() - chrono::Duration::hours(1)),
        }));
        let client = ApiClient::new(base, session.clone());

        let list: Vec<Value> = client.list("/okupasi", &[]).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(rejected.load(Ordering::SeqCst), 0);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(session.access_token().await.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_retry_still_401_after_refresh_clears_session() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = refreshes.clone();
        let router = Router::new()
            .route(
                "/okupasi",
                get(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({ "status": false }))) }),
            )
            .route(
                "/auth/refresh",
                post(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "status": true, "data": { "access_token": "t2" } }))
                    }
                }),
            );
        let base = spawn_upstream(router).await;
        let session = session_with("t1", Some("r1"));
        let client = ApiClient::new(base, session.clone());

        let err = client.list::<Value>("/okupasi", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_concurrent_401s_refresh_once() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));
        let base = spawn_upstream(t2_upstream(refreshes.clone(), rejected.clone())).await;
        let session = session_with("t1", Some("r1"));
        let client = ApiClient::new(base, session.clone());

        let (a, b, c) = tokio::join!(
            client.list::<Value>("/okupasi", &[]),
            client.list::<Value>("/okupasi", &[]),
            client.list::<Value>("/okupasi", &[]),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(session.access_token().await.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_401_without_recovery_clears_session() {
        let router = Router::new().route(
            "/sekolah",
            get(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({ "status": false }))) }),
        );
        let base = spawn_upstream(router).await;
        let session = session_with("stale", None);
        let client = ApiClient::new(base, session.clone());

        let err = client.list::<Value>("/sekolah", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_401_falls_back_to_service_credentials() {
        let router = Router::new()
            .route(
                "/asesmen",
                get(|headers: HeaderMap| async move {
                    if bearer(&headers).as_deref() == Some("Bearer svc") {
                        (AxumStatus::OK, Json(json!({ "status": 200, "data": [] })))
                    } else {
                        (AxumStatus::UNAUTHORIZED, Json(json!({})))
                    }
                }),
            )
            .route(
                "/auth/login",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["username"], "layanan");
                    Json(json!({ "status": true, "data": { "access_token": "svc" } }))
                }),
            );
        let base = spawn_upstream(router).await;
        let client = ApiClient::new(base, Arc::new(SessionContext::new()))
            .with_credentials(Some(("layanan".to_string(), "pw".to_string())));

        let list: Vec<Value> = client.list("/asesmen", &[]).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(
            client.session().info().await.username.as_deref(),
            Some("layanan")
        );
    }

    #[tokio::test]
    async fn test_login_stores_tokens() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async {
                Json(json!({
                    "status": "success",
                    "data": { "access_token": "a", "refresh_token": "r", "expires_in": 3600 }
                }))
            }),
        );
        let base = spawn_upstream(router).await;
        let client = ApiClient::new(base, Arc::new(SessionContext::new()));

        let info = client.login("admin", "rahasia").await.unwrap();
        assert!(info.authenticated);
        assert_eq!(info.username.as_deref(), Some("admin"));
        assert!(info.expires_at.is_some());
        assert_eq!(client.session().refresh_token().await.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_non_success_envelope_is_rejected() {
        let router = Router::new().route(
            "/konsentrasi",
            post(|| async {
                Json(json!({ "status": false, "message": "Nama sudah dipakai" }))
            }),
        );
        let base = spawn_upstream(router).await;
        let client = ApiClient::new(base, Arc::new(SessionContext::new()));

        let err = client
            .create("/konsentrasi", &json!({ "nama": "TKJ" }))
            .await
            .unwrap_err();
        match err {
            ApiError::Rejected { message } => assert_eq!(message, "Nama sudah dipakai"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_404_maps_to_not_found() {
        let base = spawn_upstream(Router::new()).await;
        let client = ApiClient::new(base, Arc::new(SessionContext::new()));

        let err = client.get::<Value>("/asesmen/99").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(path) if path == "/asesmen/99"));
    }
}
