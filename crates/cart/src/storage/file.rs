//! Directory-backed storage shared between processes.
//!
//! Each key is one `<key>.json` file under the data directory. Writes go to a
//! temporary file that is renamed over the target, so readers never observe a
//! partially written value.
//!
//! Other processes' writes are discovered by [`FileStorage::poll`], which
//! compares every key file against the last value this handle wrote or saw.
//! A handle's own writes update that snapshot first, so they never come back
//! as change events.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};

use super::{KeyValueStore, StorageError, StorageEvent, StorageEvents};
use crate::notify::{CartNotifier, Listeners, Subscription, lock};

const EXTENSION: &str = "json";

/// Distinguishes temp files of concurrent writers within one process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

struct Inner {
    dir: PathBuf,
    /// Last known value of every key file.
    snapshot: Mutex<HashMap<String, String>>,
    listeners: Listeners<StorageEvent>,
    notifier: CartNotifier,
}

/// A file-backed storage handle. Each handle is its own execution context;
/// clones share the context.
#[derive(Clone)]
pub struct FileStorage {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("dir", &self.inner.dir)
            .field("listeners", &self.inner.listeners.len())
            .finish_non_exhaustive()
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Best-effort removal of a temp file left by a failed write.
fn discard_temp(tmp: &Path) {
    match fs::remove_file(tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %tmp.display(), error = %e, "cannot remove temp file"),
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

impl FileStorage {
    /// Open (creating if needed) a data directory.
    ///
    /// The current contents become this handle's baseline: values already on
    /// disk are not reported by the first [`poll`](Self::poll).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created or read.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        let storage = Self {
            inner: Arc::new(Inner {
                snapshot: Mutex::new(HashMap::new()),
                listeners: Listeners::new(),
                notifier: CartNotifier::new(),
                dir,
            }),
        };
        let baseline = storage.scan()?;
        *lock(&storage.inner.snapshot) = baseline;
        debug!(dir = %storage.inner.dir.display(), "opened file storage");
        Ok(storage)
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.inner.dir.join(format!("{key}.{EXTENSION}")))
    }

    /// Read every key file currently on disk.
    fn scan(&self) -> Result<HashMap<String, String>, StorageError> {
        let dir = &self.inner.dir;
        let mut values = HashMap::new();
        for entry in fs::read_dir(dir).map_err(io_error(dir))? {
            let path = entry.map_err(io_error(dir))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_key(key).is_err() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(value) => {
                    values.insert(key.to_owned(), value);
                }
                // Removed between listing and reading.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path)(e)),
            }
        }
        Ok(values)
    }

    /// Report changes other handles or processes made since the last poll.
    ///
    /// Emits one [`StorageEvent`] per key whose file was created, changed or
    /// deleted, and returns how many events were emitted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the data directory cannot be read.
    pub fn poll(&self) -> Result<usize, StorageError> {
        let current = self.scan()?;
        let events: Vec<StorageEvent> = {
            let mut snapshot = lock(&self.inner.snapshot);
            let mut events = Vec::new();
            for (key, value) in &current {
                let old_value = snapshot.get(key);
                if old_value != Some(value) {
                    events.push(StorageEvent {
                        key: key.clone(),
                        old_value: old_value.cloned(),
                        new_value: Some(value.clone()),
                    });
                }
            }
            for (key, old_value) in snapshot.iter() {
                if !current.contains_key(key) {
                    events.push(StorageEvent {
                        key: key.clone(),
                        old_value: Some(old_value.clone()),
                        new_value: None,
                    });
                }
            }
            *snapshot = current;
            events
        };

        for event in &events {
            trace!(key = %event.key, "external storage change");
            self.inner.listeners.emit(event);
        }
        Ok(events.len())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self
            .inner
            .dir
            .join(format!(
                ".{key}.{}.{}.tmp",
                std::process::id(),
                WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
            ));
        if let Err(e) = fs::write(&tmp, value) {
            discard_temp(&tmp);
            return Err(io_error(&tmp)(e));
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            discard_temp(&tmp);
            return Err(io_error(&path)(e));
        }
        lock(&self.inner.snapshot).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&path)(e)),
        }
        lock(&self.inner.snapshot).remove(key);
        Ok(())
    }
}

impl StorageEvents for FileStorage {
    fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    fn local_changes(&self) -> &CartNotifier {
        &self.inner.notifier
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(storage: &FileStorage) -> (Arc<Mutex<Vec<StorageEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscription = {
            let events = Arc::clone(&events);
            storage.on_change(move |event| lock(&events).push(event.clone()))
        };
        (events, subscription)
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert_eq!(storage.get("cart").unwrap(), None);
        storage.set("cart", "[]").unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("cart.json").exists());

        storage.remove("cart").unwrap();
        storage.remove("cart").unwrap();
        assert_eq!(storage.get("cart").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        for key in ["", "../cart", "a/b", "cart.json"] {
            assert!(matches!(
                storage.set(key, "[]"),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_own_writes_are_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let (events, _sub) = record(&storage);

        storage.set("cart", "[]").unwrap();
        storage.remove("cart").unwrap();

        assert_eq!(storage.poll().unwrap(), 0);
        assert!(lock(&events).is_empty());
    }

    #[test]
    fn test_poll_reports_other_handles_writes() {
        let dir = tempfile::tempdir().unwrap();
        let tab_a = FileStorage::open(dir.path()).unwrap();
        let tab_b = FileStorage::open(dir.path()).unwrap();
        let (events, _sub) = record(&tab_b);

        tab_a.set("cart", "[1]").unwrap();
        assert_eq!(tab_b.poll().unwrap(), 1);
        assert_eq!(tab_b.poll().unwrap(), 0);

        tab_a.remove("cart").unwrap();
        assert_eq!(tab_b.poll().unwrap(), 1);

        let events = lock(&events);
        assert_eq!(events[0].new_value.as_deref(), Some("[1]"));
        assert_eq!(events[0].old_value, None);
        assert_eq!(events[1].old_value.as_deref(), Some("[1]"));
        assert_eq!(events[1].new_value, None);
    }

    #[test]
    fn test_existing_values_are_the_baseline() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .set("cart", "[]")
            .unwrap();

        let later = FileStorage::open(dir.path()).unwrap();
        assert_eq!(later.poll().unwrap(), 0);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        // A directory in the way makes the rename fail.
        fs::create_dir(dir.path().join("cart.json")).unwrap();

        assert!(matches!(
            storage.set("cart", "[]"),
            Err(StorageError::Io { .. })
        ));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
    }
}
