// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application-facing REST client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::auth::{LoginRequest, LoginResponse};
use crate::config::ClientConfig;
use crate::credential::storage::Storage;
use crate::credential::{CredentialStore, Identity, Session};
use crate::dispatch::{ApiRequest, ApiResponse, Dispatcher};
use crate::error::DispatchError;
use crate::refresh::RefreshCoordinator;
use crate::session::{Navigator, SessionInvalidator};

/// One authenticated client session.
///
/// Owns the credential store, refresh coordinator, and dispatcher; dropping
/// the client tears all of them down together.
pub struct ApiClient {
    dispatcher: Dispatcher,
}

impl ApiClient {
    /// Build a client whose session is seeded from `storage`.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(CredentialStore::load(storage));
        let invalidator = SessionInvalidator::new(Arc::clone(&store), navigator);
        let coordinator = Arc::new(RefreshCoordinator::new(Arc::clone(&store), invalidator));
        let dispatcher = Dispatcher::new(config, store, coordinator)?;
        Ok(Self { dispatcher })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        self.dispatcher.store()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().is_authenticated()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.store().user()
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, DispatchError> {
        self.dispatcher.send(request).await
    }

    /// Log in and replace the stored session.
    ///
    /// A rejected login leaves the current session untouched.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, DispatchError> {
        let path = self.dispatcher.config().login_path.clone();
        let request = ApiRequest::post(path).json(&LoginRequest { username, password })?;
        let resp: LoginResponse = self.send(request).await?.json()?;

        let session = Session::from(resp);
        let user = session.user.clone();
        self.store().set_session(session);
        info!(username, "logged in");
        Ok(user)
    }

    /// Forget the local session.
    pub fn logout(&self) {
        self.store().clear();
        info!("logged out");
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DispatchError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, DispatchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, DispatchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), DispatchError> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }
}
