//! Persistent key-value storage.
//!
//! Both the task store and the theme resolver keep their state in a single
//! whole-value slot each. The `Storage` trait is the seam: `FileStorage` backs
//! the binary with one file per key, `MemoryStorage` backs the tests and can be
//! told to misbehave (unavailable, over quota).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Slot holding the serialized task collection.
pub const TASKS_KEY: &str = "tasks";
/// Slot holding the theme preference token.
pub const THEME_KEY: &str = "theme-preference";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("quota exceeded writing '{key}': {len} bytes, limit {quota}")]
    QuotaExceeded { key: String, len: usize, quota: usize },

    #[error("could not serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous, whole-value get/set store keyed by string.
pub trait Storage {
    /// Read the value under `key`. A key that was never written is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Directory-backed storage: each key lives in `<dir>/<sanitized key>`.
///
/// Values are opaque text, so the files carry no extension.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(FileStorage { dir: dir.to_path_buf() })
    }

    /// Path of the file that holds `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key_file_name(key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut buf = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|source| StorageError::Io { key: key.to_string(), source })?;
        Ok(Some(buf))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        write_then_rename(&tmp, &path, value).map_err(|source| {
            // Never leave a half-written temp file behind.
            let _ = fs::remove_file(&tmp);
            StorageError::Io { key: key.to_string(), source }
        })
    }
}

/// Atomic-ish write via temp + rename.
fn write_then_rename(tmp: &Path, path: &Path, value: &str) -> std::io::Result<()> {
    let mut f = File::create(tmp)?;
    f.write_all(value.as_bytes())?;
    f.flush()?;
    drop(f);
    fs::rename(tmp, path)
}

/// Convert a storage key to a safe file stem.
/// Lowercases and collapses every run of non-alphanumeric characters to one underscore.
pub fn key_file_name(key: &str) -> String {
    key.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
    unavailable: Cell<bool>,
    quota: Cell<Option<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let storage = Self::new();
        {
            let mut values = storage.values.borrow_mut();
            for (k, v) in entries {
                values.insert(k.to_string(), v.to_string());
            }
        }
        storage
    }

    /// Make every subsequent access fail with `StorageError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Reject writes whose value is longer than `quota` bytes.
    pub fn set_quota(&self, quota: Option<usize>) {
        self.quota.set(quota);
    }

    /// Raw value under `key`, bypassing the failure switches.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            return Err(StorageError::Unavailable("storage disabled".into()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(quota) = self.quota.get() {
            if value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    len: value.len(),
                    quota,
                });
            }
        }
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
