// Durable key-value storage backing the preference stores

use crate::errors::SwingError;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Trait defining the interface for string key-value storage
pub trait KeyValueStorage: Send + 'static {
    /// Read the raw value stored under `key`, `None` if nothing was stored
    fn get_item(&self, key: &str) -> Result<Option<String>, SwingError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SwingError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), SwingError>;
}

/// File-based storage: one file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBasedStorage {
    storage_path: PathBuf,
}

impl FileBasedStorage {
    /// Create a new file-based storage instance
    pub fn new(storage_path: PathBuf) -> Result<Self, SwingError> {
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path).map_err(|e| SwingError::StorageIO {
                key: storage_path.display().to_string(),
                source: e,
            })?;
        }

        Ok(Self { storage_path })
    }

    /// Create storage in the default application data directory
    pub fn new_default() -> Result<Self, SwingError> {
        Self::new(Self::default_storage_path()?)
    }

    /// Get the default storage path for preferences
    pub fn default_storage_path() -> Result<PathBuf, SwingError> {
        let app_data_dir = dirs::data_dir().ok_or(SwingError::NoDataDir)?;
        Ok(app_data_dir.join("swingview").join("preferences"))
    }

    /// Get the storage directory path
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn file_path_for_key(&self, key: &str) -> PathBuf {
        self.storage_path
            .join(format!("{}.pref", Self::normalize_key(key)))
    }

    /// Normalize a key for consistent file naming
    fn normalize_key(key: &str) -> String {
        key.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl KeyValueStorage for FileBasedStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SwingError> {
        let file_path = self.file_path_for_key(key);
        match fs::read_to_string(&file_path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No stored value for {} at {:?}", key, file_path);
                Ok(None)
            }
            Err(e) => Err(SwingError::StorageIO {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SwingError> {
        let file_path = self.file_path_for_key(key);
        let temp_path = file_path.with_extension("pref.tmp");
        let to_storage_err = |e| SwingError::StorageIO {
            key: key.to_string(),
            source: e,
        };

        // Write to temporary file first
        {
            let mut temp_file = fs::File::create(&temp_path).map_err(to_storage_err)?;
            temp_file
                .write_all(value.as_bytes())
                .map_err(to_storage_err)?;
            temp_file.sync_all().map_err(to_storage_err)?;
        }

        // Atomically move temporary file to final location
        fs::rename(&temp_path, &file_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            to_storage_err(e)
        })?;

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), SwingError> {
        let file_path = self.file_path_for_key(key);
        match fs::remove_file(&file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SwingError::StorageIO {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

/// In-memory storage. Clones share the same map, so a test can keep one handle
/// and hand another to a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with an I/O error
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    /// Raw snapshot of what is currently stored under `key`
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn check_failing(&self, key: &str) -> Result<(), SwingError> {
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(SwingError::StorageIO {
                key: key.to_string(),
                source: io::Error::other("storage unavailable"),
            });
        }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SwingError> {
        self.check_failing(key)?;
        Ok(self.peek(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SwingError> {
        self.check_failing(key)?;
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), SwingError> {
        self.check_failing(key)?;
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
