// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Why a token refresh did not produce a new access token.
///
/// Always terminal for the session: the coordinator clears credentials and
/// hands a clone of the same failure to every queued request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    #[error("no refresh token available")]
    MissingRefreshToken,
    #[error("refresh rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("refresh request failed: {0}")]
    Network(String),
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),
}

impl RefreshFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRefreshToken => "MISSING_REFRESH_TOKEN",
            Self::Rejected { .. } => "REFRESH_REJECTED",
            Self::Network(_) => "REFRESH_NETWORK",
            Self::InvalidResponse(_) => "REFRESH_INVALID_RESPONSE",
        }
    }
}

/// Failure kinds surfaced by [`crate::Dispatcher::send`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rejected for credential reasons and not recoverable.
    #[error("authorization failed ({status})")]
    Authorization { status: u16, body: String },
    /// The token refresh failed; the session has been invalidated.
    #[error("session expired: {0}")]
    Refresh(#[from] RefreshFailure),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorization { .. } => "UNAUTHORIZED",
            Self::Refresh(_) => "SESSION_EXPIRED",
            Self::Network(_) => "NETWORK",
            Self::Server { .. } => "SERVER",
            Self::Decode(_) => "DECODE",
        }
    }

    /// HTTP status carried by the failure, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authorization { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Refresh(RefreshFailure::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller must log in again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Authorization { .. } | Self::Refresh(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
