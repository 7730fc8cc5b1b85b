// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end client scenarios.
//!
//! Runs an in-process mock of the placeview backend: a login endpoint, a
//! refresh endpoint that can be held open, and protected `/api` resources
//! that only accept the most recently issued access token.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use placeview_client::credential::storage::Storage;
use placeview_client::session::Navigator;
use placeview_client::{ApiClient, ClientConfig};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Password the mock accepts for every username.
pub const PASSWORD: &str = "secret";

/// One request that reached a protected resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
}

#[derive(Default)]
struct Tokens {
    /// Generation of the most recently issued access token (`A{n}`).
    generation: u32,
    access: Option<String>,
    refresh: Option<String>,
}

struct BackendState {
    tokens: Mutex<Tokens>,
    rotate: AtomicBool,
    revoked: AtomicBool,
    reject_all: AtomicBool,
    /// `true` while refresh calls are held open.
    hold: watch::Sender<bool>,
    refreshes: AtomicU32,
    logins: AtomicU32,
    seen: Mutex<Vec<Seen>>,
}

impl BackendState {
    fn new() -> Self {
        Self {
            tokens: Mutex::new(Tokens::default()),
            rotate: AtomicBool::new(false),
            revoked: AtomicBool::new(false),
            reject_all: AtomicBool::new(false),
            hold: watch::channel(false).0,
            refreshes: AtomicU32::new(0),
            logins: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn issue_access(&self, tokens: &mut Tokens) -> String {
        tokens.generation += 1;
        let access = format!("A{}", tokens.generation);
        tokens.access = Some(access.clone());
        access
    }
}

/// A running mock backend. The server task lives until the runtime stops.
#[derive(Clone)]
pub struct MockBackend {
    base_url: String,
    state: Arc<BackendState>,
}

impl MockBackend {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(BackendState::new());
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/api/{*rest}", any(resource))
            .with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { base_url: format!("http://{addr}"), state })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
    }

    /// Build a client against this backend.
    pub fn client(
        &self,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<ApiClient> {
        ApiClient::new(self.config(), storage, navigator)
    }

    /// Invalidate the current access token; the refresh token stays valid.
    pub fn expire_access(&self) {
        self.state.tokens.lock().access = None;
    }

    /// Make every subsequent refresh fail with 401.
    pub fn revoke_refresh(&self) {
        self.state.revoked.store(true, Ordering::SeqCst);
    }

    /// Issue a new refresh token with every refresh.
    pub fn rotate_refresh_tokens(&self) {
        self.state.rotate.store(true, Ordering::SeqCst);
    }

    /// Answer every resource call with 401, even with a valid token.
    pub fn reject_all(&self) {
        self.state.reject_all.store(true, Ordering::SeqCst);
    }

    /// Hold refresh calls open until [`MockBackend::release_refresh`].
    pub fn hold_refresh(&self) {
        self.state.hold.send_replace(true);
    }

    pub fn release_refresh(&self) {
        self.state.hold.send_replace(false);
    }

    pub fn refreshes(&self) -> u32 {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> u32 {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.tokens.lock().access.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.tokens.lock().refresh.clone()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.state.seen.lock().clone()
    }

    /// Bearer tokens of every resource call, in arrival order.
    pub fn bearers(&self) -> Vec<Option<String>> {
        self.state.seen.lock().iter().map(|s| s.bearer.clone()).collect()
    }
}

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    let username = body["username"].as_str().unwrap_or_default().to_owned();
    if body["password"] != PASSWORD || username.is_empty() {
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }

    let mut tokens = state.tokens.lock();
    let access = state.issue_access(&mut tokens);
    let refresh = format!("R{}", tokens.generation);
    tokens.refresh = Some(refresh.clone());
    Json(serde_json::json!({
        "accessToken": access,
        "refreshToken": refresh,
        "user": { "id": 1, "username": username, "role": "member" },
    }))
    .into_response()
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let ticket = state.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
    let mut hold = state.hold.subscribe();
    if hold.wait_for(|held| !held).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    // A later refresh arrived while this one was held; its client gave up.
    if ticket != state.refreshes.load(Ordering::SeqCst) {
        return (StatusCode::CONFLICT, "superseded by a later refresh").into_response();
    }
    if state.revoked.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "refresh token revoked").into_response();
    }

    let mut tokens = state.tokens.lock();
    let presented = body["refreshToken"].as_str();
    if presented.is_none() || presented != tokens.refresh.as_deref() {
        return (StatusCode::UNAUTHORIZED, "unknown refresh token").into_response();
    }
    let access = state.issue_access(&mut tokens);
    if state.rotate.load(Ordering::SeqCst) {
        let refresh = format!("R{}", tokens.generation);
        tokens.refresh = Some(refresh.clone());
        return Json(serde_json::json!({ "accessToken": access, "refreshToken": refresh }))
            .into_response();
    }
    Json(serde_json::json!({ "accessToken": access })).into_response()
}

async fn resource(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);
    state.seen.lock().push(Seen {
        method: method.to_string(),
        path: uri.path().to_owned(),
        bearer: bearer.clone(),
    });

    let valid = state.tokens.lock().access.clone();
    if state.reject_all.load(Ordering::SeqCst) || bearer.is_none() || bearer != valid {
        return (StatusCode::UNAUTHORIZED, "token expired").into_response();
    }
    if uri.path() == "/api/fail" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let body: serde_json::Value = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    Json(serde_json::json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "body": body,
    }))
    .into_response()
}

/// Navigator that counts login redirects.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicU32,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> u32 {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `cond` until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, cond: impl Fn() -> bool) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}
