//! Client-local key-value persistence.
//!
//! Every persisted domain (commands, preferences, avatars, theme) lives under
//! one key and is rewritten whole on each change.
//!
//! - [`FileStore`] keeps one file per key under the platform data dir
//! - [`MemoryStore`] keeps everything in memory (tests, throwaway sessions)

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const KEY_COMMANDS: &str = "userCommands";
pub const KEY_PREFERENCES: &str = "userPreferences";
pub const KEY_USER_AVATAR: &str = "userDP";
pub const KEY_AI_AVATAR: &str = "aiDP";
pub const KEY_THEME: &str = "theme";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write key '{key}': {source}")]
    Write { key: String, source: io::Error },

    #[error("failed to delete key '{key}': {source}")]
    Delete { key: String, source: io::Error },

    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Abstract persistent key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Serialize `value` as JSON and store it under `key`.
pub fn set_json<T: serde::Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Read and decode a JSON value. Missing keys and corrupt data both yield `None`.
pub fn get_json<T: serde::de::DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring corrupt stored value");
            None
        }
    }
}

// ============================================
// File-backed store
// ============================================

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `$GEMCHAT_DATA_DIR`, or the platform local data dir.
    pub fn open_default() -> Self {
        Self::new(default_data_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GEMCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("gemchat");
    }
    PathBuf::from("cache").join("gemchat")
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| StorageError::CreateDir {
            path: self.root.clone(),
            source,
        })?;
        fs::write(self.path_for(key), value).map_err(|source| StorageError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path).map_err(|source| StorageError::Delete {
                key: key.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Sanitize storage key for filesystem use
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

// ============================================
// In-memory store
// ============================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
