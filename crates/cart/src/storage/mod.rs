//! Key-value storage ports the cart persists through.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] - synchronous `get`/`set`/`remove` of text values
//! - [`StorageEvents`] - the backend's native change notification, delivered
//!   only for writes made by *other* execution contexts, plus the context's
//!   own [`CartNotifier`] for same-context broadcasts
//!
//! Backends synchronize their own internal state but offer no cross-context
//! locking: concurrent writers to the same key race and the last write wins.

mod file;
mod memory;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use file::FileStorage;
pub use memory::{MemoryStorage, StorageContext};

use crate::notify::{CartNotifier, Subscription};

/// Errors that can occur when reading or writing a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Synchronous key-value store holding text values.
pub trait KeyValueStore {
    /// Read the value for `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A value change made by another execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Change notification of one execution context on a storage backend.
///
/// A context never receives [`StorageEvent`]s for its own writes; those are
/// announced on [`Self::local_changes`] instead.
pub trait StorageEvents {
    /// Register `listener` until the returned [`Subscription`] is dropped.
    fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static;

    /// Same-context broadcast shared by every cart store on this context.
    fn local_changes(&self) -> &CartNotifier;
}

/// Identity of one execution context sharing a storage origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// A fresh random context ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
