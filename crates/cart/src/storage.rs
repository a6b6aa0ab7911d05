//! Durable key-value storage for the cart.
//!
//! The cart lives in one string slot, as a JSON array of line-items, the same
//! way the web storefront keeps it in browser local storage. Two backends are
//! provided:
//!
//! - [`FileStorage`] - a JSON object file of `{ key: value }` slots
//! - [`MemoryStorage`] - a process-local map, for tests and ephemeral carts
//!
//! Reading the cart back is validating: anything that does not decode to a
//! well-formed [`Cart`] is discarded with a diagnostic rather than loaded.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rocketshoes_core::Cart;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of string slots.
    #[error("Corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a value failed.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A previous writer panicked while holding the storage lock.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// A string-keyed slot store, like browser local storage.
pub trait CartStorage: Send + Sync {
    /// Read a slot. Missing slots are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a slot. Deleting a missing slot is not an error.
    ///
    /// The store never calls this: it is how the cart gets cleared from
    /// outside, after which the next [`load_cart`] starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// What happened when the cart was read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    /// No cart had been stored; started empty.
    Missing,
    /// A valid cart was restored.
    Loaded { items: usize },
    /// Stored content was unreadable or invalid; started empty.
    Discarded { reason: String },
}

/// Read the cart from its slot, falling back to an empty cart.
///
/// Never fails: read errors and invalid content both produce an empty cart
/// and a [`LoadReport::Discarded`] explaining why.
pub fn load_cart(storage: &dyn CartStorage, key: &str) -> (Cart, LoadReport) {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Cart::new(), LoadReport::Missing),
        Err(e) => {
            tracing::warn!(error = %e, key = %key, "Failed to read stored cart, starting empty");
            return (
                Cart::new(),
                LoadReport::Discarded {
                    reason: e.to_string(),
                },
            );
        }
    };

    match serde_json::from_str::<Cart>(&raw) {
        Ok(cart) => {
            let items = cart.len();
            (cart, LoadReport::Loaded { items })
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                key = %key,
                stored = %raw.chars().take(200).collect::<String>(),
                "Stored cart failed validation, starting empty"
            );
            (
                Cart::new(),
                LoadReport::Discarded {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Overwrite the cart slot with `cart`.
///
/// # Errors
///
/// Returns an error if encoding or the backend write fails.
pub fn save_cart(storage: &dyn CartStorage, key: &str, cart: &Cart) -> Result<(), StorageError> {
    let value = serde_json::to_string(cart)?;
    storage.set(key, &value)
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// Process-local slot store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one slot pre-filled.
    #[must_use]
    pub fn with_slot(key: &str, value: &str) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.to_string(), value.to_string());
        Self {
            slots: Mutex::new(slots),
        }
    }
}

impl CartStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Slot store backed by a single JSON file.
///
/// Writes go to a uniquely named sibling temp file that is renamed over the
/// original, so a crash mid-write leaves the previous contents intact and
/// several processes can write the same file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Use the file at `path`. The file and its parent directories are
    /// created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_slots(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let contents = serde_json::to_string_pretty(slots)?;

        // Unique temp name per write; concurrent writers never share one
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(contents.as_bytes()).map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

impl CartStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut slots = self.read_slots()?;
        Ok(slots.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        // A corrupt file would otherwise make every write fail forever
        let mut slots = match self.read_slots() {
            Err(StorageError::Corrupt { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "Replacing corrupt storage file"
                );
                BTreeMap::new()
            }
            other => other?,
        };
        slots.insert(key.to_string(), value.to_string());
        self.write_slots(&slots)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut slots = self.read_slots()?;
        if slots.remove(key).is_some() {
            self.write_slots(&slots)?;
        }
        Ok(())
    }
}
