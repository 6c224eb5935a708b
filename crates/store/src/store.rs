//! The cart state container.
//!
//! [`CartStore`] holds the current [`Cart`] behind a version counter and
//! exposes exactly three mutations: [`CartStore::add_product`],
//! [`CartStore::remove_product`], and [`CartStore::update_amount`].
//! Consumers read through [`CartStore::snapshot`] or subscribe to the
//! watch channel via [`CartStore::subscribe`].
//!
//! # Commit protocol
//!
//! Stock lookups happen without holding the state lock, so two mutations
//! may race on the same snapshot. Each mutation captures `(cart, version)`
//! up front and commits with a compare-and-set on the version: if another
//! mutation landed in between, the operation retries from a fresh
//! snapshot. The persistence write happens inside the commit section,
//! before the in-memory update - a failed write leaves both the in-memory
//! cart and the persisted copy as they were.

use std::sync::Arc;

use cartwheel_core::{Cart, CartEntry, ProductId};
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use crate::error::CartError;
use crate::persist::{PersistError, PersistenceStore, STORAGE_KEY};
use crate::stock::StockService;

/// Commit attempts per mutation before giving up with `Conflict`.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Shopping-cart state container.
///
/// Cheaply cloneable via `Arc`; clones share the same cart. Constructed
/// once at session start from a [`StockService`] and a
/// [`PersistenceStore`], then passed by reference (or clone) to consumers.
pub struct CartStore<S, P> {
    inner: Arc<CartStoreInner<S, P>>,
}

impl<S, P> Clone for CartStore<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CartStoreInner<S, P> {
    stock: S,
    persistence: P,
    state: Mutex<VersionedCart>,
    watch_tx: watch::Sender<Cart>,
}

/// Cart plus a counter bumped on every commit.
struct VersionedCart {
    cart: Cart,
    version: u64,
}

impl<S, P> CartStore<S, P>
where
    S: StockService,
    P: PersistenceStore,
{
    /// Create a store, restoring the cart persisted in a previous session.
    ///
    /// An absent or unreadable persisted cart starts the session empty;
    /// unreadable state is logged at warn and overwritten on the next
    /// successful mutation.
    pub async fn new(stock: S, persistence: P) -> Self {
        let cart = restore(&persistence).await;
        let (watch_tx, _) = watch::channel(cart.clone());

        Self {
            inner: Arc::new(CartStoreInner {
                stock,
                persistence,
                state: Mutex::new(VersionedCart { cart, version: 0 }),
                watch_tx,
            }),
        }
    }

    /// Current cart snapshot.
    pub async fn snapshot(&self) -> Cart {
        self.inner.state.lock().await.cart.clone()
    }

    /// Subscribe to committed cart snapshots.
    ///
    /// The receiver immediately holds the current cart and is updated on
    /// every successful mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.watch_tx.subscribe()
    }

    /// Add one unit of a product to the cart.
    ///
    /// A product not yet in the cart is fetched from the stock service and
    /// added with amount 1; an existing entry is incremented. In both
    /// cases the candidate amount (`current + 1`) is validated against the
    /// stock reported at call time.
    ///
    /// # Errors
    ///
    /// - [`CartError::StockExceeded`] if the candidate amount exceeds stock
    /// - [`CartError::Stock`] if the stock or metadata lookup fails
    /// - [`CartError::Persistence`] if the cart cannot be saved
    /// - [`CartError::Conflict`] if concurrent mutations exhaust retries
    ///
    /// The cart is unchanged on every error path.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<(), CartError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let (mut cart, version) = self.versioned_snapshot().await;
            let available = self.inner.stock.stock(product_id).await?;

            if let Some(current) = cart.amount_of(product_id) {
                // The candidate amount is what would land in the cart, so
                // it is current + 1 that gets checked against stock.
                let candidate = current.saturating_add(1);
                if candidate > available {
                    tracing::warn!(
                        current,
                        available,
                        "add rejected: candidate amount exceeds stock"
                    );
                    return Err(CartError::StockExceeded { product_id });
                }
                let updated = cart.set_amount(product_id, candidate);
                debug_assert!(updated, "entry vanished from the local snapshot");
            } else {
                if available < 1 {
                    tracing::warn!("add rejected: product out of stock");
                    return Err(CartError::StockExceeded { product_id });
                }
                let product = self.inner.stock.product(product_id).await?;
                let inserted = cart.insert(CartEntry::new(product, 1));
                debug_assert!(inserted, "duplicate entry in the local snapshot");
            }

            if self.try_commit(version, cart).await? {
                return Ok(());
            }
            tracing::debug!("commit conflict, retrying add");
        }

        Err(CartError::Conflict { product_id })
    }

    /// Remove one unit of a product from the cart.
    ///
    /// An entry with amount 1 is removed entirely; otherwise the amount is
    /// decremented by exactly 1. Removal never needs a stock check.
    ///
    /// # Errors
    ///
    /// - [`CartError::EntityNotFound`] if the product is not in the cart
    /// - [`CartError::Persistence`] if the cart cannot be saved
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<(), CartError> {
        // No remote lookup, so the whole operation runs under the lock.
        let mut state = self.inner.state.lock().await;

        let Some(current) = state.cart.amount_of(product_id) else {
            tracing::warn!("remove rejected: product not in cart");
            return Err(CartError::EntityNotFound { product_id });
        };

        let mut cart = state.cart.clone();
        if current > 1 {
            let updated = cart.set_amount(product_id, current - 1);
            debug_assert!(updated, "entry vanished from the local snapshot");
        } else {
            let removed = cart.remove(product_id);
            debug_assert!(removed.is_some(), "entry vanished from the local snapshot");
        }

        self.persist_and_publish(&mut state, cart).await
    }

    /// Set a product's amount to an exact value (absolute, not a delta).
    ///
    /// Silently ignored when `amount` is zero or negative, or when the
    /// product is not in the cart; this operation never removes entries.
    ///
    /// # Errors
    ///
    /// - [`CartError::StockExceeded`] if `amount` exceeds available stock
    /// - [`CartError::Stock`] if the stock lookup fails
    /// - [`CartError::Persistence`] if the cart cannot be saved
    /// - [`CartError::Conflict`] if concurrent mutations exhaust retries
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_amount(&self, product_id: ProductId, amount: i64) -> Result<(), CartError> {
        if amount <= 0 {
            tracing::debug!(amount, "ignoring non-positive amount update");
            return Ok(());
        }

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let (mut cart, version) = self.versioned_snapshot().await;
            if cart.entry(product_id).is_none() {
                tracing::debug!("ignoring amount update for product not in cart");
                return Ok(());
            }

            let available = self.inner.stock.stock(product_id).await?;
            if amount > i64::from(available) {
                tracing::warn!(
                    amount,
                    available,
                    "update rejected: requested amount exceeds stock"
                );
                return Err(CartError::StockExceeded { product_id });
            }
            // amount <= available <= u32::MAX at this point
            let amount = u32::try_from(amount).unwrap_or(available);
            let updated = cart.set_amount(product_id, amount);
            debug_assert!(updated, "entry vanished from the local snapshot");

            if self.try_commit(version, cart).await? {
                return Ok(());
            }
            tracing::debug!("commit conflict, retrying amount update");
        }

        Err(CartError::Conflict { product_id })
    }

    /// Capture the current cart and its version for a later compare-and-set.
    async fn versioned_snapshot(&self) -> (Cart, u64) {
        let state = self.inner.state.lock().await;
        (state.cart.clone(), state.version)
    }

    /// Commit `cart` if no other mutation landed since `expected_version`.
    ///
    /// Returns `Ok(false)` on a version conflict (caller retries).
    async fn try_commit(&self, expected_version: u64, cart: Cart) -> Result<bool, CartError> {
        let mut state = self.inner.state.lock().await;
        if state.version != expected_version {
            return Ok(false);
        }
        self.persist_and_publish(&mut state, cart).await?;
        Ok(true)
    }

    /// Persist, commit in memory, and notify observers, in that order.
    async fn persist_and_publish(
        &self,
        state: &mut VersionedCart,
        cart: Cart,
    ) -> Result<(), CartError> {
        let serialized = serde_json::to_string(&cart).map_err(PersistError::from)?;
        self.inner.persistence.set(STORAGE_KEY, &serialized).await?;

        state.cart = cart.clone();
        state.version += 1;
        self.inner.watch_tx.send_replace(cart);
        Ok(())
    }
}

/// Load the cart persisted by a previous session.
async fn restore<P: PersistenceStore>(persistence: &P) -> Cart {
    match persistence.get(STORAGE_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!(error = %e, "persisted cart is unreadable, starting empty");
                Cart::new()
            }
        },
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read persisted cart, starting empty");
            Cart::new()
        }
    }
}
