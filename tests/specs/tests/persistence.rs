// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sessions stored on disk survive across client instances.

use std::sync::Arc;

use placeview_client::credential::storage::FileStorage;
use placeview_client::credential::CredentialStore;
use placeview_specs::{MockBackend, RecordingNavigator, PASSWORD};

#[tokio::test]
async fn session_survives_restart_and_tracks_refreshes() -> anyhow::Result<()> {
    let backend = MockBackend::start().await?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("credentials.json");

    {
        let storage = Arc::new(FileStorage::open(&path));
        let client = backend.client(storage, Arc::new(RecordingNavigator::default()))?;
        client.login("alice", PASSWORD).await?;
    }

    let navigator = Arc::new(RecordingNavigator::default());
    let client = backend.client(Arc::new(FileStorage::open(&path)), navigator.clone())?;
    assert!(client.is_authenticated());
    assert_eq!(client.current_user().map(|u| u.username), Some("alice".to_owned()));

    backend.expire_access();
    client.get_json::<serde_json::Value>("/api/places").await?;
    assert_eq!(backend.logins(), 1);

    let reloaded = CredentialStore::load(Arc::new(FileStorage::open(&path)));
    assert_eq!(reloaded.access_token(), backend.access_token());
    assert_eq!(reloaded.refresh_token().as_deref(), Some("R1"));
    Ok(())
}

#[tokio::test]
async fn failed_refresh_clears_the_file() -> anyhow::Result<()> {
    let backend = MockBackend::start().await?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("credentials.json");
    let navigator = Arc::new(RecordingNavigator::default());
    let client = backend.client(Arc::new(FileStorage::open(&path)), navigator.clone())?;
    client.login("alice", PASSWORD).await?;

    backend.expire_access();
    backend.revoke_refresh();
    assert!(client.get_json::<serde_json::Value>("/api/places").await.is_err());

    let reloaded = CredentialStore::load(Arc::new(FileStorage::open(&path)));
    assert!(reloaded.is_empty());
    assert_eq!(navigator.redirects(), 1);
    Ok(())
}
