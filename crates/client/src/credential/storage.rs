// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key/value persistence for session credentials.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Client-side key/value store backing the credential store.
///
/// Writes are best-effort: implementations log failures instead of
/// returning them.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Apply several writes as a single change; `None` removes the key.
    fn apply(&self, changes: &[(&str, Option<&str>)]) {
        for (key, value) in changes {
            match value {
                Some(value) => self.set(key, value),
                None => self.remove(key),
            }
        }
    }
}

fn apply_to(entries: &mut BTreeMap<String, String>, changes: &[(&str, Option<&str>)]) -> bool {
    let mut changed = false;
    for (key, value) in changes {
        let previous = match value {
            Some(value) => entries.insert((*key).to_owned(), (*value).to_owned()),
            None => entries.remove(*key),
        };
        changed |= previous.as_deref() != *value;
    }
    changed
}

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) {
        apply_to(&mut self.entries.lock(), changes);
    }
}

/// Storage backed by a single JSON object file.
///
/// The file is read once on open and rewritten atomically (tmp + rename)
/// after every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, loading existing entries.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<BTreeMap<String, String>>(&data) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), "failed to parse stored credentials: {e}");
                    BTreeMap::new()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), "no stored credentials: {e}");
                BTreeMap::new()
            }
        };
        Self { path, entries: Mutex::new(entries) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) {
        if let Err(e) = write_atomic(&self.path, entries) {
            warn!(path = %self.path.display(), "failed to persist credentials: {e:#}");
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) {
        let mut entries = self.entries.lock();
        if apply_to(&mut entries, changes) {
            self.flush(&entries);
        }
    }
}

/// Replace `path` with `entries` in one step.
///
/// The JSON goes to a fresh temp file in the same directory (so the rename
/// never crosses filesystems) and is synced before it is moved over `path`;
/// readers see either the old file or the new one.
fn write_atomic(path: &Path, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, entries)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
