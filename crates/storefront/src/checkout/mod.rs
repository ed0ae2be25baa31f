//! Checkout orchestration.
//!
//! A [`CheckoutSession`] walks the customer through
//! `Contact -> Shipping -> Payment` and then either confirms a card payment
//! (ending in `Complete`) or files a pay-later request (ending in
//! `Submitted`). Collaborators are injected through [`CheckoutContext`].

mod card;
pub mod resolver;
mod session;
#[cfg(test)]
pub(crate) mod testing;

pub use card::{CardInput, validate_card};
pub use resolver::{EntryPoint, Resolution, ResolveError, ResolvedIntent, resolve_intent};
pub use session::{
    Advisory, CheckoutSession, CheckoutState, Completion, EntryDecision, ProcessingFlag,
    ScheduledRedirect, SubmitOutcome,
};

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthSession;
use crate::cart::{CartLineItem, CartStore};
use crate::models::BuyNowProduct;
use crate::storage::KeyValueStore;

/// Redirect targets and timing for the checkout flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Where the customer lands after a successful payment.
    pub complete_redirect: String,
    /// How long the completion screen stays up before that redirect.
    pub redirect_delay: Duration,
    /// Guest checkout page for guests who started from the cart.
    pub guest_checkout_path: String,
    /// Where a checkout with nothing to buy is sent.
    pub empty_cart_redirect: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            complete_redirect: "/order-confirmation".to_string(),
            redirect_delay: Duration::from_secs(3),
            guest_checkout_path: "/checkout/guest".to_string(),
            empty_cart_redirect: "/cart".to_string(),
        }
    }
}

/// Services a checkout session depends on.
pub struct CheckoutContext<A, P> {
    pub api: A,
    pub payments: P,
    pub auth: AuthSession,
    /// Session-scoped storage holding the buy-now descriptor.
    pub session_storage: Arc<dyn KeyValueStore>,
    pub settings: CheckoutSettings,
}

/// What is being bought.
#[derive(Debug, Clone)]
pub enum Purchase {
    /// The shared cart; cleared after a successful payment.
    Cart(CartStore),
    /// A single product bought from its product page.
    BuyNow(BuyNowProduct),
}

impl Purchase {
    /// Current lines. Read fresh on every call, so validation always sees
    /// the cart as it is now.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        match self {
            Self::Cart(cart) => cart.items(),
            Self::BuyNow(product) => vec![product.to_line_item()],
        }
    }

    #[must_use]
    pub fn total_cents(&self) -> u64 {
        self.items()
            .iter()
            .map(CartLineItem::line_total_cents)
            .fold(0, u64::saturating_add)
    }
}
