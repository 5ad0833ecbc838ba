//! Arwa Shop Cart - the persisted shopping cart.
//!
//! The cart lives in a key-value store shared by every execution context of
//! the storefront (browser tabs, or processes sharing a data directory). The
//! store is the single source of truth: every operation re-reads it, mutates,
//! and writes the whole cart back.
//!
//! # Components
//!
//! - [`CartStore`] - add / set quantity / remove / total over a [`KeyValueStore`]
//! - [`CartNotifier`] - same-context broadcast raised after every persist,
//!   owned by the storage context so every store on it shares one
//! - [`CartWatch`] - folds the same-context broadcast and the storage port's
//!   cross-context [`StorageEvent`] into one [`CartChanged`] stream
//! - [`CartBadge`] - live unit count built on [`CartWatch`]
//!
//! # Storage backends
//!
//! - [`MemoryStorage`] - one origin with any number of [`StorageContext`] tabs
//! - [`FileStorage`] - one JSON file per key, cross-process changes via
//!   [`FileStorage::poll`]
//!
//! # Concurrency
//!
//! Operations inside one context run to completion synchronously. Contexts are
//! not coordinated with each other: two contexts that load the same cart and
//! both write it back race, and the last write wins.
//!
//! # Example
//!
//! ```rust
//! use arwa_shop_cart::{CartBadge, CartStore, MemoryStorage};
//! use arwa_shop_core::{CartProduct, Price, ProductId};
//!
//! let origin = MemoryStorage::new();
//! let store = CartStore::new(origin.context());
//! let badge = CartBadge::attach(&store);
//!
//! let backpack = CartProduct {
//!     id: ProductId::new(1),
//!     title: "Backpack".to_string(),
//!     price: Price::from_cents(10995),
//!     image: "https://example.com/1.jpg".to_string(),
//! };
//! store.add_or_increment(&backpack)?;
//! store.add_or_increment(&backpack)?;
//!
//! assert_eq!(badge.count(), 2);
//! assert_eq!(store.total()?.to_string(), "$219.90");
//! # Ok::<(), arwa_shop_cart::CartError>(())
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod cart;
mod error;
mod notify;
pub mod storage;
mod store;
mod summary;
mod watch;

pub use cart::{Cart, LineItem};
pub use error::{CartError, ErrorPolicy};
pub use notify::{
    CartChanged, CartNotifier, ChangeOrigin, Listeners, Subscription, WeakListeners,
};
pub use storage::{
    ContextId, FileStorage, KeyValueStore, MemoryStorage, StorageContext, StorageError,
    StorageEvent, StorageEvents,
};
pub use store::CartStore;
pub use summary::{
    CHECKOUT_MESSAGE, CartSummary, CheckoutReceipt, EMPTY_CART_MESSAGE, SummaryLine,
};
pub use watch::{CartBadge, CartWatch, badge_label};
