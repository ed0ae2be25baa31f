//! Buy-now purchase descriptor.
//!
//! A buy-now purchase bypasses the cart. The product page writes a
//! [`BuyNowProduct`] to session storage before navigating to checkout; when
//! the backend has already created a payment intent for it, the intent rides
//! along either in the descriptor or in the checkout URL.

use serde::{Deserialize, Serialize};

use glasshouse_core::{Dimensions, PaymentIntentId, ProductId};

use crate::cart::CartLineItem;
use crate::storage::{KeyValueStore, StorageError, read_json, write_json};

use super::session::keys;

/// Query parameter carrying a pre-created intent's client secret.
const CLIENT_SECRET_PARAM: &str = "payment_intent_client_secret";

/// Query parameter carrying a pre-created intent's id.
const INTENT_ID_PARAM: &str = "payment_intent";

/// A single product purchased without going through the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyNowProduct {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
    pub unit_price_cents: u64,
    pub quantity: u32,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    /// Intent created by the product page, if any.
    #[serde(default)]
    pub payment_intent: Option<PresuppliedIntent>,
}

impl BuyNowProduct {
    /// The purchase expressed as a cart line, for validation and intent
    /// requests.
    #[must_use]
    pub fn to_line_item(&self) -> CartLineItem {
        CartLineItem {
            product_id: self.product_id.clone(),
            variant_name: self.variant_name.clone(),
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            product_name: self.product_name.clone(),
            product_image: self.product_image.clone(),
            product_slug: self.product_slug.clone(),
            category: self.category.clone(),
            dimensions: self.dimensions,
        }
    }

    /// Attach an intent found in the checkout URL's query string, unless the
    /// descriptor already carries one.
    #[must_use]
    pub fn with_intent_from_query(mut self, query: &str) -> Self {
        if self.payment_intent.is_none() {
            self.payment_intent = PresuppliedIntent::from_query(query);
        }
        self
    }
}

/// A payment intent created before checkout started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresuppliedIntent {
    pub id: PaymentIntentId,
    pub client_secret: String,
}

impl PresuppliedIntent {
    /// Build from a client secret; the intent id is the secret's prefix
    /// (`pi_123_secret_abc` belongs to `pi_123`).
    #[must_use]
    pub fn from_client_secret(client_secret: &str) -> Option<Self> {
        let client_secret = client_secret.trim();
        let (id, rest) = client_secret.split_once("_secret_")?;
        if id.is_empty() || rest.is_empty() {
            return None;
        }
        Some(Self {
            id: PaymentIntentId::new(id),
            client_secret: client_secret.to_string(),
        })
    }

    /// Parse `payment_intent_client_secret` (and optionally `payment_intent`)
    /// from a URL query string. A leading `?` is ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut secret = None;
        let mut id = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                CLIENT_SECRET_PARAM => secret = Some(value.into_owned()),
                INTENT_ID_PARAM => id = Some(value.into_owned()),
                _ => {}
            }
        }

        let intent = Self::from_client_secret(&secret?)?;
        match id {
            Some(id) if id != intent.id.as_str() => {
                tracing::warn!(
                    url_intent = %id,
                    secret_intent = %intent.id,
                    "Ignoring payment intent whose id does not match its client secret"
                );
                None
            }
            _ => Some(intent),
        }
    }
}

/// Write the buy-now descriptor to session storage.
///
/// # Errors
///
/// Returns an error if session storage cannot be written.
pub fn save(store: &dyn KeyValueStore, product: &BuyNowProduct) -> Result<(), StorageError> {
    write_json(store, keys::BUY_NOW_PRODUCT, product)
}

/// Read the buy-now descriptor from session storage.
///
/// An unreadable descriptor is logged and treated as absent.
///
/// # Errors
///
/// Returns an error if session storage cannot be read.
pub fn load(store: &dyn KeyValueStore) -> Result<Option<BuyNowProduct>, StorageError> {
    match read_json(store, keys::BUY_NOW_PRODUCT) {
        Ok(product) => Ok(product),
        Err(StorageError::Json(e)) => {
            tracing::warn!(error = %e, "Discarding unreadable buy-now descriptor");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Remove the buy-now descriptor from session storage.
///
/// # Errors
///
/// Returns an error if session storage cannot be written.
pub fn clear(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(keys::BUY_NOW_PRODUCT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn window() -> BuyNowProduct {
        BuyNowProduct {
            product_id: ProductId::new("casement-window"),
            product_name: "Casement Window".to_string(),
            product_slug: Some("casement-window".to_string()),
            category: None,
            product_image: None,
            variant_name: None,
            unit_price_cents: 54_000,
            quantity: 2,
            dimensions: None,
            payment_intent: None,
        }
    }

    #[test]
    fn test_from_client_secret() {
        let intent = PresuppliedIntent::from_client_secret("pi_3Nx_secret_abc").unwrap();
        assert_eq!(intent.id.as_str(), "pi_3Nx");
        assert_eq!(intent.client_secret, "pi_3Nx_secret_abc");

        assert!(PresuppliedIntent::from_client_secret("").is_none());
        assert!(PresuppliedIntent::from_client_secret("pi_3Nx").is_none());
        assert!(PresuppliedIntent::from_client_secret("_secret_abc").is_none());
    }

    #[test]
    fn test_from_query() {
        let intent = PresuppliedIntent::from_query(
            "?product=casement-window&payment_intent=pi_9&payment_intent_client_secret=pi_9_secret_z",
        )
        .unwrap();
        assert_eq!(intent.id.as_str(), "pi_9");

        assert!(PresuppliedIntent::from_query("product=casement-window").is_none());
    }

    #[test]
    fn test_from_query_rejects_mismatched_id() {
        assert!(
            PresuppliedIntent::from_query(
                "payment_intent=pi_1&payment_intent_client_secret=pi_2_secret_z"
            )
            .is_none()
        );
    }

    #[test]
    fn test_with_intent_from_query_keeps_existing() {
        let mut product = window();
        product.payment_intent = PresuppliedIntent::from_client_secret("pi_1_secret_a");

        let product = product.with_intent_from_query("payment_intent_client_secret=pi_2_secret_b");
        assert_eq!(product.payment_intent.unwrap().id.as_str(), "pi_1");
    }

    #[test]
    fn test_session_storage_roundtrip() {
        let store = MemoryStore::new();
        assert!(load(&store).unwrap().is_none());

        save(&store, &window()).unwrap();
        assert_eq!(load(&store).unwrap(), Some(window()));

        clear(&store).unwrap();
        assert!(load(&store).unwrap().is_none());
    }

    #[test]
    fn test_load_discards_garbage() {
        let store = MemoryStore::new();
        store.set(keys::BUY_NOW_PRODUCT, "[1,2,3]").unwrap();
        assert!(load(&store).unwrap().is_none());
    }

    #[test]
    fn test_to_line_item() {
        let line = window().to_line_item();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_total_cents(), 108_000);
    }
}
