//! Cart observers.
//!
//! A cart can change from two directions: some store on this context
//! persisted it (the context's [`CartNotifier`](crate::CartNotifier)) or
//! another context wrote the cart key (the backend's [`StorageEvent`]).
//! Neither channel covers both, so
//! [`CartWatch`] subscribes to each and folds them into one [`CartChanged`]
//! stream. Both registrations live exactly as long as the watch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::notify::{CartChanged, Subscription};
use crate::storage::{KeyValueStore, StorageEvent, StorageEvents};
use crate::store::CartStore;

/// Both change channels of one cart store, folded into a single handler.
///
/// Dropping the watch releases both registrations.
#[derive(Debug)]
#[must_use = "dropping a CartWatch stops observing the cart"]
pub struct CartWatch {
    _local: Subscription,
    _remote: Subscription,
}

impl CartWatch {
    /// Call `on_change` after every local persist and every write to the cart
    /// key from another context.
    pub fn new<S, F>(store: &CartStore<S>, on_change: F) -> Self
    where
        S: KeyValueStore + StorageEvents,
        F: Fn(CartChanged) + Send + Sync + 'static,
    {
        let on_change = Arc::new(on_change);

        let local = {
            let on_change = Arc::clone(&on_change);
            store.notifier().subscribe(move |change| (*on_change)(*change))
        };

        let key = store.key().to_owned();
        let remote = store.storage().on_change(move |event: &StorageEvent| {
            if event.key == key {
                (*on_change)(CartChanged::remote());
            }
        });

        Self {
            _local: local,
            _remote: remote,
        }
    }
}

/// Badge label, e.g. `Cart, 2 items`.
#[must_use]
pub fn badge_label(count: u64) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Cart, {count} item{plural}")
}

/// Live count of units in the cart, as shown on the header badge.
#[derive(Debug)]
pub struct CartBadge {
    count: Arc<AtomicU64>,
    _watch: CartWatch,
}

impl CartBadge {
    /// Start tracking `store`'s unit count.
    pub fn attach<S>(store: &CartStore<S>) -> Self
    where
        S: KeyValueStore + StorageEvents + Clone + Send + Sync + 'static,
    {
        Self::attach_with(store, |_| {})
    }

    /// Start tracking `store`'s unit count, calling `on_update` with the new
    /// count after every recomputation.
    pub fn attach_with<S, F>(store: &CartStore<S>, on_update: F) -> Self
    where
        S: KeyValueStore + StorageEvents + Clone + Send + Sync + 'static,
        F: Fn(u64) + Send + Sync + 'static,
    {
        let count = Arc::new(AtomicU64::new(read_count(store)));

        let watch = {
            let count = Arc::clone(&count);
            let source = store.clone();
            CartWatch::new(store, move |change| {
                let n = read_count(&source);
                count.store(n, Ordering::SeqCst);
                debug!(origin = ?change.origin, count = n, "cart badge updated");
                on_update(n);
            })
        };

        Self {
            count,
            _watch: watch,
        }
    }

    /// Units currently in the cart.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// The badge bubble is only shown for a non-empty cart.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.count() > 0
    }

    #[must_use]
    pub fn label(&self) -> String {
        badge_label(self.count())
    }
}

/// The badge shows 0 rather than an error for an unreadable cart.
fn read_count<S: KeyValueStore>(store: &CartStore<S>) -> u64 {
    store.item_count().unwrap_or_else(|e| {
        warn!(error = %e, "cannot read cart for badge");
        0
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use arwa_shop_core::{CartProduct, Price, ProductId};

    use super::*;
    use crate::error::ErrorPolicy;
    use crate::notify::{ChangeOrigin, lock};
    use crate::storage::MemoryStorage;

    fn product(id: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            title: "A".to_string(),
            price: Price::from_cents(999),
            image: "x".to_string(),
        }
    }

    #[test]
    fn test_watch_sees_both_channels() {
        let origin = MemoryStorage::new();
        let here = CartStore::new(origin.context());
        let elsewhere = CartStore::new(origin.context());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _watch = {
            let seen = Arc::clone(&seen);
            CartWatch::new(&here, move |change| lock(&seen).push(change.origin))
        };

        here.add_or_increment(&product(1)).unwrap();
        elsewhere.add_or_increment(&product(2)).unwrap();

        assert_eq!(
            *lock(&seen),
            vec![ChangeOrigin::Local, ChangeOrigin::Remote]
        );
    }

    #[test]
    fn test_watch_ignores_other_keys() {
        let origin = MemoryStorage::new();
        let here = CartStore::new(origin.context());
        let hits = Arc::new(AtomicU64::new(0));
        let _watch = {
            let hits = Arc::clone(&hits);
            CartWatch::new(&here, move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        origin.context().set("wishlist", "[]").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropping_watch_releases_registrations() {
        let origin = MemoryStorage::new();
        let here = CartStore::new(origin.context());

        let watch = CartWatch::new(&here, |_| {});
        assert_eq!(here.notifier().observer_count(), 1);

        drop(watch);
        assert_eq!(here.notifier().observer_count(), 0);
    }

    #[test]
    fn test_badge_counts_units() {
        let origin = MemoryStorage::new();
        let store = CartStore::new(origin.context());
        let badge = CartBadge::attach(&store);
        assert_eq!(badge.count(), 0);
        assert!(!badge.is_visible());

        store.add_or_increment(&product(1)).unwrap();
        store.add_or_increment(&product(1)).unwrap();
        store.add_or_increment(&product(2)).unwrap();

        assert_eq!(badge.count(), 3);
        assert!(badge.is_visible());
        assert_eq!(badge.label(), "Cart, 3 items");
    }

    #[test]
    fn test_badge_sees_other_store_in_same_context() {
        let origin = MemoryStorage::new();
        let tab = origin.context();
        let header = CartStore::new(tab.clone());
        let product_view = CartStore::new(tab);
        let badge = CartBadge::attach(&header);

        product_view.add_or_increment(&product(1)).unwrap();
        product_view.add_or_increment(&product(1)).unwrap();

        assert_eq!(product_view.item_count().unwrap(), 2);
        assert_eq!(badge.count(), 2);
    }

    #[test]
    fn test_badge_reports_updates() {
        let origin = MemoryStorage::new();
        let store = CartStore::new(origin.context());
        let updates = Arc::new(Mutex::new(Vec::new()));
        let _badge = {
            let updates = Arc::clone(&updates);
            CartBadge::attach_with(&store, move |n| lock(&updates).push(n))
        };

        store.add_or_increment(&product(1)).unwrap();
        store.set_quantity(ProductId::new(1), 4).unwrap();
        store.set_quantity(ProductId::new(1), 0).unwrap();

        assert_eq!(*lock(&updates), vec![1, 4]);
    }

    #[test]
    fn test_badge_on_corrupt_cart_shows_zero() {
        let origin = MemoryStorage::new();
        origin.context().set("cart", "not json").unwrap();
        let store = CartStore::new(origin.context()).with_policy(ErrorPolicy::Strict);

        let badge = CartBadge::attach(&store);
        assert_eq!(badge.count(), 0);
    }

    #[test]
    fn test_badge_label() {
        assert_eq!(badge_label(0), "Cart, 0 items");
        assert_eq!(badge_label(1), "Cart, 1 item");
        assert_eq!(badge_label(2), "Cart, 2 items");
    }
}
