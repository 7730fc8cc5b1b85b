// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session credentials: the in-memory store and its durable backing.

pub mod storage;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credential::storage::{Storage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};

/// Opaque bearer credential.
pub type Token = String;

/// Authenticated user as reported by the backend at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend user id (string or numeric, passed through untouched).
    #[serde(default)]
    pub id: serde_json::Value,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<Token>,
    pub refresh_token: Option<Token>,
    pub user: Option<Identity>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// Guarded cell holding the session, mirrored to [`Storage`] on every change.
///
/// Reads never touch storage. Writes update memory and storage under the
/// same lock so the persisted copy never runs ahead of or behind memory.
pub struct CredentialStore {
    session: RwLock<Session>,
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    /// Create an empty store. Nothing is read from `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { session: RwLock::new(Session::default()), storage }
    }

    /// Create a store seeded from whatever `storage` already holds.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let user = storage.get(USER_KEY).and_then(|raw| match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("ignoring unreadable stored user: {e}");
                None
            }
        });
        let session = Session {
            access_token: storage.get(ACCESS_TOKEN_KEY),
            refresh_token: storage.get(REFRESH_TOKEN_KEY),
            user,
        };
        debug!(
            has_access = session.access_token.is_some(),
            has_refresh = session.refresh_token.is_some(),
            "loaded stored session"
        );
        Self { session: RwLock::new(session), storage }
    }

    pub fn access_token(&self) -> Option<Token> {
        self.session.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<Token> {
        self.session.read().refresh_token.clone()
    }

    pub fn user(&self) -> Option<Identity> {
        self.session.read().user.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().access_token.is_some()
    }

    /// True when no session field is set.
    pub fn is_empty(&self) -> bool {
        self.session.read().is_empty()
    }

    pub fn set_access_token(&self, token: Option<Token>) {
        let mut session = self.session.write();
        persist(self.storage.as_ref(), ACCESS_TOKEN_KEY, token.as_deref());
        session.access_token = token;
    }

    pub fn set_refresh_token(&self, token: Option<Token>) {
        let mut session = self.session.write();
        persist(self.storage.as_ref(), REFRESH_TOKEN_KEY, token.as_deref());
        session.refresh_token = token;
    }

    pub fn set_user(&self, user: Option<Identity>) {
        let mut session = self.session.write();
        let encoded = user.as_ref().and_then(encode_user);
        persist(self.storage.as_ref(), USER_KEY, encoded.as_deref());
        session.user = user;
    }

    /// Store a refreshed access token and, if rotated, the new refresh token.
    pub fn set_tokens(&self, access_token: Token, refresh_token: Option<Token>) {
        let mut session = self.session.write();
        match refresh_token {
            Some(refresh_token) => {
                self.storage.apply(&[
                    (ACCESS_TOKEN_KEY, Some(access_token.as_str())),
                    (REFRESH_TOKEN_KEY, Some(refresh_token.as_str())),
                ]);
                session.refresh_token = Some(refresh_token);
            }
            None => self.storage.set(ACCESS_TOKEN_KEY, &access_token),
        }
        session.access_token = Some(access_token);
    }

    /// Replace the whole session at once (login).
    pub fn set_session(&self, next: Session) {
        let mut session = self.session.write();
        let user = next.user.as_ref().and_then(encode_user);
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, next.access_token.as_deref()),
            (REFRESH_TOKEN_KEY, next.refresh_token.as_deref()),
            (USER_KEY, user.as_deref()),
        ]);
        *session = next;
    }

    /// Drop every session field and its persisted copy in one step.
    pub fn clear(&self) {
        let mut session = self.session.write();
        *session = Session::default();
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, None),
            (REFRESH_TOKEN_KEY, None),
            (USER_KEY, None),
        ]);
    }
}

fn persist(storage: &dyn Storage, key: &str, value: Option<&str>) {
    match value {
        Some(value) => storage.set(key, value),
        None => storage.remove(key),
    }
}

fn encode_user(user: &Identity) -> Option<String> {
    match serde_json::to_string(user) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("failed to serialize user: {e}");
            None
        }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
