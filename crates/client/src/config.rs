// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the placeview backend.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the placeview API.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "PLACEVIEW_API_URL")]
    pub api_url: String,

    /// Path of the token refresh endpoint.
    #[arg(long, default_value = "/auth/refresh", env = "PLACEVIEW_REFRESH_PATH")]
    pub refresh_path: String,

    /// Path of the login endpoint.
    #[arg(long, default_value = "/auth/login", env = "PLACEVIEW_LOGIN_PATH")]
    pub login_path: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 30000, env = "PLACEVIEW_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Directory holding persisted credentials.
    #[arg(long, env = "PLACEVIEW_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Config pointing at `api_url` with every other setting at its default.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            refresh_path: "/auth/refresh".to_owned(),
            login_path: "/auth/login".to_owned(),
            timeout_ms: 30000,
            state_dir: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Join an endpoint path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Resolve the state directory.
    ///
    /// Uses `--state-dir` if set, then `$XDG_STATE_HOME/placeview`,
    /// then `$HOME/.local/state/placeview`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("placeview");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/placeview");
        }
        PathBuf::from(".placeview")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.state_dir().join("credentials.json")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
