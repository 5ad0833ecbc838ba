//! In-process publish/subscribe used for both cart and storage notifications.
//!
//! Listeners are called synchronously on the emitting thread. The registry lock
//! is released before any callback runs, so a callback may subscribe, drop a
//! subscription, or call back into the cart store.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

/// Lock a mutex, recovering the data if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

/// A set of listeners for events of type `E`.
///
/// Cheaply cloneable; clones share the same registry.
pub struct Listeners<E> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

impl<E: 'static> Listeners<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(listener)));
            id
        };

        let registry: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    lock(&registry).entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Call every registered listener with `event`. Returns how many ran.
    ///
    /// Listeners registered or released while this call runs take effect on
    /// the next emit.
    pub fn emit(&self, event: &E) -> usize {
        let callbacks: Vec<Callback<E>> = lock(&self.inner)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }
}

impl<E> Listeners<E> {
    /// A handle that does not keep the registry alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakListeners<E> {
        WeakListeners {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`Listeners`] reference that lapses once every strong handle is gone.
pub struct WeakListeners<E> {
    inner: Weak<Mutex<Registry<E>>>,
}

impl<E> WeakListeners<E> {
    /// The listener set, if its owner is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Listeners<E>> {
        self.inner.upgrade().map(|inner| Listeners { inner })
    }
}

impl<E> fmt::Debug for WeakListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakListeners")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// A listener registration. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters the listener immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Where a cart change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// This execution context persisted the cart.
    Local,
    /// Another execution context wrote the cart key.
    Remote,
}

/// "The persisted cart changed." Observers re-load the cart rather than
/// trusting any payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartChanged {
    pub origin: ChangeOrigin,
}

impl CartChanged {
    #[must_use]
    pub const fn local() -> Self {
        Self {
            origin: ChangeOrigin::Local,
        }
    }

    #[must_use]
    pub const fn remote() -> Self {
        Self {
            origin: ChangeOrigin::Remote,
        }
    }
}

/// Same-context change broadcast raised by the cart store after each persist.
#[derive(Debug, Clone, Default)]
pub struct CartNotifier {
    listeners: Listeners<CartChanged>,
}

impl CartNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for local cart changes.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartChanged) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Tell every local observer the cart changed.
    pub fn notify(&self) -> usize {
        let delivered = self.listeners.emit(&CartChanged::local());
        trace!(delivered, "cart change broadcast");
        delivered
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.listeners.len()
    }
}
