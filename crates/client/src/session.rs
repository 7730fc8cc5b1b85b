// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session invalidation and the "go to login" navigation hook.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::credential::CredentialStore;

/// Application capability to send the user back to the login entry point.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Events emitted when the session state changes underneath the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were cleared after a failed refresh; the user must log in.
    LoginRequired,
}

/// [`Navigator`] that broadcasts [`SessionEvent`]s to any number of listeners.
#[derive(Debug, Clone)]
pub struct NavigationEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl NavigationEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for NavigationEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for NavigationEvents {
    fn redirect_to_login(&self) {
        // No subscribers is fine; the session is already cleared.
        let _ = self.tx.send(SessionEvent::LoginRequired);
    }
}

/// Clears the credential store and redirects to login after an unrecoverable
/// refresh failure.
#[derive(Clone)]
pub struct SessionInvalidator {
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionInvalidator {
    pub fn new(store: Arc<CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// Clear the session and signal the navigator.
    ///
    /// A no-op when already logged out. Returns whether anything was cleared.
    pub fn invalidate(&self) -> bool {
        if self.store.is_empty() {
            return false;
        }
        self.store.clear();
        info!("session invalidated, redirecting to login");
        self.navigator.redirect_to_login();
        true
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
