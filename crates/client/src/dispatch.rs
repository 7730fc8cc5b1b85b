// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound request dispatch with transparent recovery from expired tokens.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::{request_refresh, TokenGrant};
use crate::config::ClientConfig;
use crate::credential::CredentialStore;
use crate::error::{DispatchError, RefreshFailure};
use crate::refresh::RefreshCoordinator;

/// A replayable outbound API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    retry: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, retry: false }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this is the single replay issued after a token refresh.
    pub fn is_retry(&self) -> bool {
        self.retry
    }

    fn into_retry(mut self) -> Self {
        self.retry = true;
        self
    }
}

/// A completed HTTP exchange with its body fully read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        if self.body.is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Map the status onto the error taxonomy without any recovery.
    fn into_result(self) -> Result<Self, DispatchError> {
        let status = self.status;
        if status == StatusCode::UNAUTHORIZED {
            return Err(DispatchError::Authorization { status: status.as_u16(), body: self.text() });
        }
        if status.is_success() || status.is_redirection() {
            return Ok(self);
        }
        Err(DispatchError::Server { status: status.as_u16(), body: self.text() })
    }
}

/// Sends every API call, recovering once from an expired access token.
pub struct Dispatcher {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl Dispatcher {
    pub fn new(
        config: ClientConfig,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Result<Self, reqwest::Error> {
        let http = crate::http_client(config.request_timeout())?;
        Ok(Self { http, config, store, coordinator })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Send `request` with the current access token.
    ///
    /// A 401 on an eligible request is recovered by refreshing the token
    /// (or waiting for the refresh already in flight) and replaying the
    /// request exactly once. The replay's outcome is returned as-is.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, DispatchError> {
        let token = self.store.access_token();
        let response = self.issue(&request, token.as_deref()).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return response.into_result();
        }
        let exempt = [self.config.refresh_path.as_str(), self.config.login_path.as_str()];
        if !is_recoverable(&request, &exempt) {
            debug!(
                method = %request.method,
                path = %request.path,
                retry = request.retry,
                "authorization failure is not recoverable"
            );
            return response.into_result();
        }

        let fresh = self.coordinator.refresh_or_wait(token.as_deref(), || self.refresh()).await?;

        let retry = request.into_retry();
        debug!(method = %retry.method, path = %retry.path, "replaying request with refreshed token");
        self.issue(&retry, Some(&fresh)).await?.into_result()
    }

    async fn issue(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, DispatchError> {
        let mut builder = self.http.request(request.method.clone(), self.config.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(method = %request.method, path = %request.path, status = status.as_u16(), "api response");
        Ok(ApiResponse { status, body })
    }

    async fn refresh(&self) -> Result<TokenGrant, RefreshFailure> {
        let refresh_token = self.store.refresh_token().ok_or(RefreshFailure::MissingRefreshToken)?;
        request_refresh(&self.http, &self.config.url(&self.config.refresh_path), &refresh_token)
            .await
    }
}

/// Whether a 401 on `request` may be recovered by refreshing.
///
/// Replays never recover again, and neither do calls to the `exempt`
/// endpoints (refresh and login), which must fail straight to the caller.
pub fn is_recoverable(request: &ApiRequest, exempt: &[&str]) -> bool {
    if request.retry {
        return false;
    }
    let path = normalize_path(&request.path);
    !exempt.iter().any(|e| normalize_path(e) == path)
}

/// Strip query, fragment, and surrounding slashes for endpoint comparison.
fn normalize_path(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path).trim_matches('/')
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
