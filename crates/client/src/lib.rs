// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placeview API client: authenticated REST access with coordinated token refresh.
//!
//! Every call the application makes goes through [`dispatch::Dispatcher::send`].
//! When the backend rejects an expired access token, the dispatcher hands off
//! to a [`refresh::RefreshCoordinator`] that keeps at most one refresh in
//! flight, queues everyone else behind it, and replays each queued request
//! exactly once with the new token. If the refresh itself fails, the
//! [`session::SessionInvalidator`] clears the credential store and asks the
//! application to send the user back to login.

pub mod auth;
pub mod client;
pub mod config;
pub mod credential;
pub mod dispatch;
pub mod error;
pub mod refresh;
pub mod session;

use std::sync::Once;
use std::time::Duration;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use dispatch::{ApiRequest, ApiResponse, Dispatcher};
pub use error::{DispatchError, RefreshFailure};
pub use reqwest::{Method, StatusCode};

/// Build the HTTP client that resource calls and refreshes go through.
///
/// reqwest is compiled without a TLS provider of its own, so the first call
/// installs rustls' ring provider for the process. A provider the host
/// application installed earlier is left in place.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    static PROVIDER: Once = Once::new();
    PROVIDER.call_once(|| {
        if rustls::crypto::ring::default_provider().install_default().is_err() {
            tracing::debug!("rustls crypto provider already installed");
        }
    });
    reqwest::Client::builder().timeout(timeout).build()
}
