//! The cart store: read, mutate, persist, notify.
//!
//! Every operation starts from a fresh [`CartStore::load`]; nothing is cached
//! between calls, because another context may have rewritten the cart in the
//! meantime. Each mutation overwrites the whole stored cart exactly once and
//! then raises exactly one same-context notification on the storage
//! context's [`CartNotifier`], which every store on that context shares.

use arwa_shop_core::{CartProduct, Price, ProductId, Quantity};
use tracing::{debug, instrument, warn};

use crate::cart::Cart;
use crate::error::{CartError, ErrorPolicy};
use crate::notify::CartNotifier;
use crate::storage::{KeyValueStore, StorageEvents};
use crate::summary::{CartSummary, CheckoutReceipt};

/// Cart operations over a key-value storage backend.
///
/// Stores built on the same storage context (or clones of it) share one
/// same-context notifier, so an observer attached through any of them sees
/// every store's writes.
#[derive(Debug, Clone)]
pub struct CartStore<S> {
    storage: S,
    key: String,
    policy: ErrorPolicy,
    notifier: CartNotifier,
}

impl<S: KeyValueStore + StorageEvents> CartStore<S> {
    /// A store on `storage` using [`Self::DEFAULT_KEY`] and the lenient policy.
    pub fn new(storage: S) -> Self {
        let notifier = storage.local_changes().clone();
        Self {
            storage,
            key: Self::DEFAULT_KEY.to_owned(),
            policy: ErrorPolicy::default(),
            notifier,
        }
    }
}

impl<S: KeyValueStore> CartStore<S> {
    /// Storage key the storefront keeps its cart under.
    pub const DEFAULT_KEY: &'static str = "cart";

    /// Use a different storage key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// The same-context channel observers subscribe to, shared with every
    /// store on this storage context.
    pub const fn notifier(&self) -> &CartNotifier {
        &self.notifier
    }

    /// Read the persisted cart.
    ///
    /// An absent key is an empty cart. A malformed value is an empty cart
    /// under [`ErrorPolicy::Lenient`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the backend cannot be read, and
    /// `CartError::Decode` for a malformed value under [`ErrorPolicy::Strict`].
    pub fn load(&self) -> Result<Cart, CartError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Cart::new());
        };
        match Cart::decode(&raw) {
            Ok(cart) => Ok(cart),
            Err(e) => match self.policy {
                ErrorPolicy::Lenient => {
                    warn!(key = %self.key, error = %e, "stored cart is malformed, treating as empty");
                    Ok(Cart::new())
                }
                ErrorPolicy::Strict => Err(CartError::Decode(e)),
            },
        }
    }

    /// Overwrite the stored cart and tell local observers.
    fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        let encoded = cart.encode().map_err(CartError::Encode)?;
        self.storage.set(&self.key, &encoded)?;
        let observers = self.notifier.notify();
        debug!(key = %self.key, lines = cart.len(), observers, "cart persisted");
        Ok(())
    }

    /// Add one unit of `product`, appending a new line if it is not in the
    /// cart yet. Returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be loaded or persisted.
    #[instrument(skip_all, fields(key = %self.key, product = %product.id))]
    pub fn add_or_increment(&self, product: &CartProduct) -> Result<Cart, CartError> {
        let mut cart = self.load()?;
        let quantity = cart.add_or_increment(product);
        self.persist(&cart)?;
        debug!(%quantity, "added to cart");
        Ok(cart)
    }

    /// Set the quantity of the line for `id`.
    ///
    /// A quantity below 1 is an ignored call under the lenient policy:
    /// nothing is written, nobody is notified, and `Ok(None)` is returned.
    /// Otherwise the cart is persisted and returned, even when `id` is not in
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a quantity below 1 under
    /// [`ErrorPolicy::Strict`], or any error from loading and persisting.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn set_quantity(&self, id: ProductId, quantity: i64) -> Result<Option<Cart>, CartError> {
        let quantity = match Quantity::new(quantity) {
            Ok(quantity) => quantity,
            Err(e) => match self.policy {
                ErrorPolicy::Lenient => {
                    debug!(error = %e, "ignoring quantity update");
                    return Ok(None);
                }
                ErrorPolicy::Strict => return Err(e.into()),
            },
        };

        let mut cart = self.load()?;
        if !cart.set_quantity(id, quantity) {
            debug!("no line to update");
        }
        self.persist(&cart)?;
        Ok(Some(cart))
    }

    /// Step the quantity of the line for `id` up by one.
    ///
    /// Returns `Ok(None)` without writing if `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be loaded or persisted.
    pub fn increment(&self, id: ProductId) -> Result<Option<Cart>, CartError> {
        self.step(id, 1)
    }

    /// Step the quantity of the line for `id` down by one.
    ///
    /// Stepping a single unit down is a quantity-0 update, so the line stays
    /// (lenient) or the call fails (strict); use [`Self::remove`] to drop it.
    /// Returns `Ok(None)` without writing if `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_quantity`].
    pub fn decrement(&self, id: ProductId) -> Result<Option<Cart>, CartError> {
        self.step(id, -1)
    }

    fn step(&self, id: ProductId, delta: i64) -> Result<Option<Cart>, CartError> {
        let Some(current) = self.load()?.get(id).map(|item| item.quantity) else {
            debug!(%id, "no line to step");
            return Ok(None);
        };
        self.set_quantity(id, i64::from(current.get()) + delta)
    }

    /// Drop the line for `id`. Removing an absent ID still persists and
    /// notifies, leaving the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be loaded or persisted.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn remove(&self, id: ProductId) -> Result<Cart, CartError> {
        let mut cart = self.load()?;
        let removed = cart.remove(id);
        self.persist(&cart)?;
        debug!(removed, "removed from cart");
        Ok(cart)
    }

    /// Sum of `price * quantity` over the stored cart.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn total(&self) -> Result<Price, CartError> {
        Ok(self.load()?.total())
    }

    /// Number of units in the stored cart.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn item_count(&self) -> Result<u64, CartError> {
        Ok(self.load()?.item_count())
    }

    /// Lines, subtotals and total of the stored cart.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn summary(&self) -> Result<CartSummary, CartError> {
        Ok(CartSummary::from(&self.load()?))
    }

    /// Acknowledge an order for the current cart.
    ///
    /// Nothing is submitted and the cart is left as it is. Returns `None` for
    /// an empty cart, which has nothing to order.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn checkout(&self) -> Result<Option<CheckoutReceipt>, CartError> {
        let cart = self.load()?;
        if cart.is_empty() {
            debug!("checkout on empty cart");
            return Ok(None);
        }
        let receipt = CheckoutReceipt::for_cart(&cart);
        debug!(items = receipt.item_count, total = %receipt.total, "checkout acknowledged");
        Ok(Some(receipt))
    }
}
