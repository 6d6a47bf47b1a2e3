//! Draft persistence.
//!
//! Drafts are a best-effort convenience: losing one costs a little typing,
//! while a storage failure during authoring must never take the editor down.
//! The store therefore never raises. Failed writes are logged and dropped,
//! and a missing or unreadable draft loads as the caller's fallback value.
//!
//! The actual key-value medium is injected through [`DraftMedium`], so the
//! same store logic runs against process memory in tests and against a
//! directory of files on a workstation.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use laudo_types::DraftKey;

/// A plain string key-value medium.
///
/// Implementations must get, set and remove without raising; a medium that
/// cannot honour an operation simply does nothing (or returns `None`).
pub trait DraftMedium: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process medium backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DraftMedium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Medium that keeps one file per key under a root directory.
#[derive(Clone, Debug)]
pub struct FileMedium {
    root: PathBuf,
}

impl FileMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key to its file path.
    ///
    /// Key bytes outside `[A-Za-z0-9-]` are escaped as `_hh`, underscore
    /// included, so the mapping is injective and distinct keys can never
    /// collide on one file.
    fn file_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' => name.push(byte as char),
                other => {
                    name.push('_');
                    name.push_str(&format!("{other:02x}"));
                }
            }
        }
        name.push_str(".json");
        self.root.join(name)
    }
}

impl DraftMedium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.file_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = fs::create_dir_all(&self.root) {
            tracing::debug!("draft dir {} not writable: {err}", self.root.display());
            return;
        }
        if let Err(err) = fs::write(self.file_for(key), value) {
            tracing::debug!("draft write for `{key}` failed: {err}");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = fs::remove_file(self.file_for(key)) {
            if err.kind() != ErrorKind::NotFound {
                tracing::debug!("draft remove for `{key}` failed: {err}");
            }
        }
    }
}

/// Typed draft store over an injected medium.
#[derive(Clone)]
pub struct DraftStore {
    medium: Arc<dyn DraftMedium>,
}

impl DraftStore {
    pub fn new(medium: Arc<dyn DraftMedium>) -> Self {
        Self { medium }
    }

    /// Store backed by process memory; drafts live as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMedium::new()))
    }

    /// Store backed by one file per draft under `root`.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileMedium::new(root)))
    }

    /// Persists `value` under `key` as JSON. Never raises; a value that does
    /// not serialize or a medium that will not take the write is logged and
    /// skipped.
    pub fn save<T: Serialize>(&self, key: &DraftKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(text) => self.medium.set(key.as_str(), &text),
            Err(err) => tracing::debug!("draft for `{key}` did not serialize: {err}"),
        }
    }

    /// Loads the draft under `key`, or `fallback` when the slot is empty or
    /// its content does not parse as `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &DraftKey, fallback: T) -> T {
        let Some(text) = self.medium.get(key.as_str()) else {
            return fallback;
        };
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!("draft for `{key}` did not parse, using fallback: {err}");
                fallback
            }
        }
    }

    /// Whether a value is stored under `key`, parseable or not.
    pub fn contains(&self, key: &DraftKey) -> bool {
        self.medium.get(key.as_str()).is_some()
    }

    /// Removes the draft under `key`. Removing an absent draft is a no-op.
    pub fn clear(&self, key: &DraftKey) {
        self.medium.remove(key.as_str());
    }
}
