//! In-memory storage origin shared by several execution contexts.
//!
//! Models browser local storage: one [`MemoryStorage`] is an origin, each
//! [`StorageContext`] is a tab on it. All tabs see the same values; a write
//! from one tab raises a [`StorageEvent`] in every other tab.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use super::{ContextId, KeyValueStore, StorageError, StorageEvent, StorageEvents};
use crate::notify::{CartNotifier, Listeners, Subscription, WeakListeners, lock};

#[derive(Default)]
struct Origin {
    values: HashMap<String, String>,
    /// Closed contexts lapse and are pruned on the next write or open.
    contexts: Vec<(ContextId, WeakListeners<StorageEvent>)>,
}

impl Origin {
    /// Listener sets of every open context except `except`, dropping closed
    /// ones from the registry.
    fn open_contexts(&mut self, except: Option<ContextId>) -> Vec<Listeners<StorageEvent>> {
        let mut open = Vec::with_capacity(self.contexts.len());
        self.contexts.retain(|(id, weak)| match weak.upgrade() {
            Some(listeners) => {
                if Some(*id) != except {
                    open.push(listeners);
                }
                true
            }
            None => false,
        });
        open
    }
}

/// A storage origin. Cheaply cloneable; clones share the same values.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    origin: Arc<Mutex<Origin>>,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut origin = lock(&self.origin);
        let contexts = origin.open_contexts(None).len();
        f.debug_struct("MemoryStorage")
            .field("keys", &origin.values.len())
            .field("contexts", &contexts)
            .finish()
    }
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new execution context on this origin.
    ///
    /// The context stays registered until its last clone is dropped.
    #[must_use]
    pub fn context(&self) -> StorageContext {
        let id = ContextId::new();
        let listeners = Listeners::new();
        {
            let mut origin = lock(&self.origin);
            origin.open_contexts(None);
            origin.contexts.push((id, listeners.downgrade()));
        }
        StorageContext {
            id,
            origin: Arc::clone(&self.origin),
            listeners,
            notifier: CartNotifier::new(),
        }
    }

    /// Number of contexts that are still open.
    #[must_use]
    pub fn context_count(&self) -> usize {
        lock(&self.origin).open_contexts(None).len()
    }

    /// Read a raw value without going through any context.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        lock(&self.origin).values.get(key).cloned()
    }
}

/// One execution context on a [`MemoryStorage`] origin.
///
/// Clones are the same context: they share its identity, its listeners and
/// its same-context [`CartNotifier`].
#[derive(Clone)]
pub struct StorageContext {
    id: ContextId,
    origin: Arc<Mutex<Origin>>,
    listeners: Listeners<StorageEvent>,
    notifier: CartNotifier,
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("id", &self.id)
            .field("listeners", &self.listeners.len())
            .field("observers", &self.notifier.observer_count())
            .finish_non_exhaustive()
    }
}

impl StorageContext {
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Store `new_value` (deleting the key for `None`), then notify every other
    /// context.
    fn write(&self, key: &str, new_value: Option<&str>) {
        let (event, others) = {
            let mut origin = lock(&self.origin);
            let old_value = match new_value {
                Some(value) => origin.values.insert(key.to_owned(), value.to_owned()),
                None => origin.values.remove(key),
            };
            let others = origin.open_contexts(Some(self.id));
            let event = StorageEvent {
                key: key.to_owned(),
                old_value,
                new_value: new_value.map(str::to_owned),
            };
            (event, others)
        };

        for listeners in &others {
            listeners.emit(&event);
        }
        trace!(context = %self.id, key, contexts = others.len(), "storage write");
    }
}

impl KeyValueStore for StorageContext {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.origin).values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(key, None);
        Ok(())
    }
}

impl StorageEvents for StorageContext {
    fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    fn local_changes(&self) -> &CartNotifier {
        &self.notifier
    }
}
