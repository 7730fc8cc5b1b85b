// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types and the raw refresh call for the backend's `/auth` endpoints.

use serde::{Deserialize, Serialize};

use crate::credential::{Identity, Session, Token};
use crate::error::RefreshFailure;

/// Body of a refresh request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// New credentials returned by the refresh endpoint.
///
/// Whether the backend rotates refresh tokens is not assumed: if one comes
/// back it replaces the stored token, otherwise the stored one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    #[serde(alias = "access_token")]
    pub access_token: Token,
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<Token>,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<Token>) -> Self {
        Self { access_token: access_token.into(), refresh_token: None }
    }
}

/// Body of a login request.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub access_token: Token,
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<Token>,
    #[serde(default)]
    pub user: Option<Identity>,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Session {
            access_token: Some(resp.access_token),
            refresh_token: resp.refresh_token,
            user: resp.user,
        }
    }
}

/// Exchange `refresh_token` for a new access token.
///
/// Issued directly on the HTTP client so it can never be intercepted.
pub async fn request_refresh(
    http: &reqwest::Client,
    url: &str,
    refresh_token: &str,
) -> Result<TokenGrant, RefreshFailure> {
    let resp = http
        .post(url)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await
        .map_err(|e| RefreshFailure::Network(e.to_string()))?;

    let status = resp.status();
    let body = resp.text().await.map_err(|e| RefreshFailure::Network(format!("read body: {e}")))?;

    if !status.is_success() {
        return Err(RefreshFailure::Rejected { status: status.as_u16(), body });
    }

    serde_json::from_str(&body).map_err(|e| RefreshFailure::InvalidResponse(e.to_string()))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
