//! Session storage keys and flags.
//!
//! Values stored here cross page navigations within one browsing session but
//! never outlive it.

use crate::storage::{KeyValueStore, StorageError, read_json, write_json};

/// Storage keys used by the storefront.
pub mod keys {
    /// Durable storage key holding the serialized cart lines.
    pub const CART: &str = "cart";

    /// Session key holding the single-product buy-now descriptor.
    pub const BUY_NOW_PRODUCT: &str = "buy_now_product";

    /// Session key set before redirecting to sign-in so the cart drawer is
    /// reopened when the user comes back.
    pub const REOPEN_CART_AFTER_SIGN_IN: &str = "reopen_cart_after_sign_in";
}

/// Remember that the cart should be reopened after sign-in completes.
///
/// # Errors
///
/// Returns an error if session storage cannot be written.
pub fn request_cart_reopen(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    write_json(store, keys::REOPEN_CART_AFTER_SIGN_IN, &true)
}

/// Consume the cart-reopen flag.
///
/// Returns `true` at most once per request; the flag is removed on read.
///
/// # Errors
///
/// Returns an error if session storage cannot be read or written.
pub fn take_cart_reopen(store: &dyn KeyValueStore) -> Result<bool, StorageError> {
    let flag = read_json::<bool>(store, keys::REOPEN_CART_AFTER_SIGN_IN)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable cart-reopen flag");
            None
        })
        .unwrap_or(false);
    store.remove(keys::REOPEN_CART_AFTER_SIGN_IN)?;
    Ok(flag)
}
