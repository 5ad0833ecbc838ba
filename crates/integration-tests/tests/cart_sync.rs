//! Integration tests for several contexts sharing one stored cart.
//!
//! In-memory tabs deliver cross-context events synchronously on write;
//! file-backed handles deliver them when the observing handle polls.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arwa_shop_cart::{
    CartBadge, CartChanged, CartStore, CartWatch, ChangeOrigin, FileStorage, KeyValueStore,
    MemoryStorage, StorageEvents,
};
use arwa_shop_core::ProductId;
use arwa_shop_integration_tests::product;

fn recorder() -> (Arc<Mutex<Vec<ChangeOrigin>>>, impl Fn(CartChanged) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |change: CartChanged| sink.lock().unwrap().push(change.origin))
}

// =============================================================================
// In-Memory Tabs
// =============================================================================

#[test]
fn test_badge_follows_other_tab() {
    let origin = MemoryStorage::new();
    let tab_a = CartStore::new(origin.context());
    let tab_b = CartStore::new(origin.context());
    let badge_a = CartBadge::attach(&tab_a);
    let badge_b = CartBadge::attach(&tab_b);

    tab_a.add_or_increment(&product(1, 500)).unwrap();
    tab_a.add_or_increment(&product(1, 500)).unwrap();
    assert_eq!(badge_a.count(), 2);
    assert_eq!(badge_b.count(), 2);

    tab_b.remove(ProductId::new(1)).unwrap();
    assert_eq!(badge_a.count(), 0);
    assert!(!badge_b.is_visible());
}

#[test]
fn test_watch_sees_each_channel_once() {
    let origin = MemoryStorage::new();
    let tab_a = CartStore::new(origin.context());
    let tab_b = CartStore::new(origin.context());
    let (seen, on_change) = recorder();
    let _watch = CartWatch::new(&tab_a, on_change);

    tab_a.add_or_increment(&product(1, 500)).unwrap();
    tab_b.add_or_increment(&product(2, 700)).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        [ChangeOrigin::Local, ChangeOrigin::Remote]
    );
}

#[test]
fn test_every_observer_in_a_tab_sees_local_writes() {
    let origin = MemoryStorage::new();
    let tab = origin.context();
    let header = CartStore::new(tab.clone());
    let product_view = CartStore::new(tab.clone());
    let cart_page = CartStore::new(tab);
    let header_badge = CartBadge::attach(&header);
    let page_badge = CartBadge::attach(&cart_page);
    let (seen, on_change) = recorder();
    let _watch = CartWatch::new(&header, on_change);

    product_view.add_or_increment(&product(1, 500)).unwrap();
    product_view.add_or_increment(&product(1, 500)).unwrap();
    cart_page.set_quantity(ProductId::new(1), 5).unwrap();

    assert_eq!(header_badge.count(), 5);
    assert_eq!(page_badge.count(), 5);
    assert_eq!(*seen.lock().unwrap(), [ChangeOrigin::Local; 3]);
}

#[test]
fn test_ignored_update_is_silent_everywhere() {
    let origin = MemoryStorage::new();
    let tab_a = CartStore::new(origin.context());
    let tab_b = origin.context();
    tab_a.add_or_increment(&product(1, 500)).unwrap();

    let remote_events = Arc::new(AtomicUsize::new(0));
    let _events = {
        let remote_events = Arc::clone(&remote_events);
        tab_b.on_change(move |_| {
            remote_events.fetch_add(1, Ordering::SeqCst);
        })
    };
    let (seen, on_change) = recorder();
    let _watch = CartWatch::new(&tab_a, on_change);

    assert!(tab_a.set_quantity(ProductId::new(1), 0).unwrap().is_none());
    assert!(tab_a.set_quantity(ProductId::new(1), -5).unwrap().is_none());

    assert_eq!(remote_events.load(Ordering::SeqCst), 0);
    assert!(seen.lock().unwrap().is_empty());

    tab_a.set_quantity(ProductId::new(1), 2).unwrap();
    assert_eq!(remote_events.load(Ordering::SeqCst), 1);
}

#[test]
fn test_other_keys_are_ignored() {
    let origin = MemoryStorage::new();
    let tab_a = CartStore::new(origin.context());
    let tab_b = origin.context();
    let (seen, on_change) = recorder();
    let _watch = CartWatch::new(&tab_a, on_change);

    tab_b.set("wishlist", "[]").unwrap();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_dropped_watch_stops_observing() {
    let origin = MemoryStorage::new();
    let tab_a = CartStore::new(origin.context());
    let tab_b = CartStore::new(origin.context());
    let calls = Arc::new(AtomicUsize::new(0));
    let watch = {
        let calls = Arc::clone(&calls);
        CartWatch::new(&tab_a, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    tab_a.add_or_increment(&product(1, 500)).unwrap();
    drop(watch);
    tab_a.add_or_increment(&product(1, 500)).unwrap();
    tab_b.add_or_increment(&product(1, 500)).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(tab_a.notifier().observer_count(), 0);
}

#[test]
fn test_last_writer_wins() {
    let origin = MemoryStorage::new();
    let tab_a = CartStore::new(origin.context());
    let tab_b = CartStore::new(origin.context());

    // Both tabs read the same empty cart, then write independently.
    let mut stale_a = tab_a.load().unwrap();
    let mut stale_b = tab_b.load().unwrap();
    stale_a.add_or_increment(&product(1, 500));
    stale_b.add_or_increment(&product(2, 700));

    tab_a.storage().set("cart", &stale_a.encode().unwrap()).unwrap();
    tab_b.storage().set("cart", &stale_b.encode().unwrap()).unwrap();

    let cart = tab_a.load().unwrap();
    assert!(cart.get(ProductId::new(1)).is_none());
    assert!(cart.get(ProductId::new(2)).is_some());
}

// =============================================================================
// File-Backed Processes
// =============================================================================

#[test]
fn test_file_handles_share_cart() {
    let dir = tempfile::tempdir().unwrap();
    let process_a = CartStore::new(FileStorage::open(dir.path()).unwrap());
    let process_b = CartStore::new(FileStorage::open(dir.path()).unwrap());

    process_a.add_or_increment(&product(3, 2500)).unwrap();
    process_a.add_or_increment(&product(4, 100)).unwrap();

    let cart = process_b.load().unwrap();
    assert_eq!(cart.len(), 2);
    assert_eq!(cart.item_count(), 2);
    assert!(dir.path().join("cart.json").is_file());
}

#[test]
fn test_badge_updates_on_poll() {
    let dir = tempfile::tempdir().unwrap();
    let process_a = CartStore::new(FileStorage::open(dir.path()).unwrap());
    let process_b = CartStore::new(FileStorage::open(dir.path()).unwrap());
    let badge_b = CartBadge::attach(&process_b);

    process_a.add_or_increment(&product(1, 500)).unwrap();
    process_a.add_or_increment(&product(1, 500)).unwrap();
    assert_eq!(badge_b.count(), 0);

    assert_eq!(process_b.storage().poll().unwrap(), 1);
    assert_eq!(badge_b.count(), 2);

    // Nothing new on disk.
    assert_eq!(process_b.storage().poll().unwrap(), 0);
}

#[test]
fn test_file_handle_shares_notifier_across_stores() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    let badge_store = CartStore::new(storage.clone());
    let writer = CartStore::new(storage);
    let badge = CartBadge::attach(&badge_store);

    writer.add_or_increment(&product(1, 500)).unwrap();
    assert_eq!(badge.count(), 1);
}

#[test]
fn test_own_writes_are_not_polled_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = CartStore::new(FileStorage::open(dir.path()).unwrap());
    let (seen, on_change) = recorder();
    let _watch = CartWatch::new(&store, on_change);

    store.add_or_increment(&product(1, 500)).unwrap();
    assert_eq!(store.storage().poll().unwrap(), 0);
    assert_eq!(*seen.lock().unwrap(), [ChangeOrigin::Local]);
}

#[test]
fn test_deleted_cart_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let process_a = CartStore::new(FileStorage::open(dir.path()).unwrap());
    process_a.add_or_increment(&product(1, 500)).unwrap();
    let process_b = CartStore::new(FileStorage::open(dir.path()).unwrap());
    let badge_b = CartBadge::attach(&process_b);
    assert_eq!(badge_b.count(), 1);

    process_a.storage().remove("cart").unwrap();
    assert_eq!(process_b.storage().poll().unwrap(), 1);
    assert_eq!(badge_b.count(), 0);
}
