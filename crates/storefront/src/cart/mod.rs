//! Client-side cart store.
//!
//! The cart belongs to the browsing session and is mirrored to durable
//! storage on every mutation. It only becomes server-authoritative once
//! checkout starts, when its lines are sent along with the intent request.
//!
//! # Example
//!
//! ```rust,ignore
//! let cart = CartStore::load(Arc::new(FileStore::open(".glasshouse")?));
//! cart.add_item(&product, None, 2, None)?;
//! assert_eq!(cart.item_count(), 2);
//! ```

mod line;

pub use line::{CartLineItem, LineKey};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::instrument;

use glasshouse_core::Dimensions;

use crate::auth::{AuthEvent, AuthSession};
use crate::models::session_keys;
use crate::models::{Product, Variant};
use crate::storage::{KeyValueStore, read_json, write_json};

/// Errors returned by cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Incrementing the line would overflow its quantity.
    #[error("Quantity overflow for product {0}")]
    QuantityOverflow(String),
}

/// Shared handle to the cart.
///
/// Cheaply cloneable via `Arc`; the header badge, line-item controls and
/// checkout all hold clones of the same store.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    lines: Mutex<Vec<CartLineItem>>,
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &*self.lines())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart persisted in `storage`.
    ///
    /// A missing value yields an empty cart. An unreadable value is logged and
    /// discarded rather than failing the page.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let lines = match read_json::<Vec<CartLineItem>>(storage.as_ref(), session_keys::CART) {
            Ok(lines) => lines.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore cart from storage, starting empty");
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(CartStoreInner {
                lines: Mutex::new(lines),
                storage,
            }),
        }
    }

    fn lines(&self) -> MutexGuard<'_, Vec<CartLineItem>> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mirror the collection to durable storage.
    ///
    /// The in-memory cart stays authoritative; a failed write is logged.
    fn persist(&self, lines: &[CartLineItem]) {
        if let Err(e) = write_json(self.inner.storage.as_ref(), session_keys::CART, lines) {
            tracing::error!(error = %e, "Failed to persist cart");
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// Increments the existing line with the same identity tuple or appends a
    /// new line priced at the variant's price (when a variant is selected) or
    /// the product's base price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::QuantityOverflow`] if the line quantity would overflow.
    #[instrument(skip(self, product, variant), fields(product_id = %product.id))]
    pub fn add_item(
        &self,
        product: &Product,
        variant: Option<&Variant>,
        quantity: u32,
        dimensions: Option<Dimensions>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        let key = LineKey {
            product_id: product.id.clone(),
            variant_name: variant.map(|v| v.name.clone()),
            dimensions,
        };

        let mut lines = self.lines();
        if let Some(line) = lines.iter_mut().find(|line| line.matches(&key)) {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| CartError::QuantityOverflow(product.id.to_string()))?;
        } else {
            lines.push(CartLineItem {
                product_id: product.id.clone(),
                variant_name: key.variant_name,
                quantity,
                unit_price_cents: variant.map_or(product.price_cents, |v| v.price_cents),
                product_name: product.name.clone(),
                product_image: product.image.clone(),
                product_slug: product.slug.clone(),
                category: product.category.clone(),
                dimensions,
            });
        }

        self.persist(&lines);
        tracing::debug!(quantity, "Added item to cart");
        Ok(())
    }

    /// Remove the line with identity `key`. Returns whether a line was removed.
    #[instrument(skip(self), fields(product_id = %key.product_id))]
    pub fn remove_item(&self, key: &LineKey) -> bool {
        let mut lines = self.lines();
        let before = lines.len();
        lines.retain(|line| !line.matches(key));
        let removed = lines.len() != before;
        if removed {
            self.persist(&lines);
        }
        removed
    }

    /// Set the quantity of the line with identity `key`.
    ///
    /// A quantity of zero or less removes the line. Updating a line that is
    /// not in the cart does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` does not fit a
    /// line quantity.
    #[instrument(skip(self), fields(product_id = %key.product_id))]
    pub fn update_quantity(&self, key: &LineKey, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            self.remove_item(key);
            return Ok(());
        }

        let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity(quantity))?;

        let mut lines = self.lines();
        match lines.iter_mut().find(|line| line.matches(key)) {
            Some(line) => {
                line.quantity = quantity;
                self.persist(&lines);
            }
            None => tracing::debug!("Quantity update for a line not in the cart"),
        }
        Ok(())
    }

    /// Empty the cart and delete its durable copy.
    pub fn clear(&self) {
        self.lines().clear();
        if let Err(e) = self.inner.storage.remove(session_keys::CART) {
            tracing::error!(error = %e, "Failed to remove persisted cart");
        }
        tracing::info!("Cart cleared");
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lines().clone()
    }

    /// Sum of `unit_price_cents * quantity` over all lines.
    #[must_use]
    pub fn total_cents(&self) -> u64 {
        self.lines()
            .iter()
            .map(CartLineItem::line_total_cents)
            .fold(0, u64::saturating_add)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines()
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Clear the cart whenever `auth` signs out.
    ///
    /// Spawns a task on the current tokio runtime that lives until every
    /// handle to the auth session is dropped.
    pub fn clear_on_sign_out(&self, auth: &AuthSession) -> JoinHandle<()> {
        let mut events = auth.subscribe();
        let auth = auth.downgrade();
        let cart = self.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedOut) => cart.clear(),
                    Ok(AuthEvent::SignedIn) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed auth events, re-checking session");
                        match auth.upgrade() {
                            Some(auth) if auth.is_signed_in() => {}
                            _ => cart.clear(),
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
