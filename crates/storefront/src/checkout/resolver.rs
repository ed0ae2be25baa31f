//! Guest / authenticated branch resolution.
//!
//! Decides where the client secret for a submit comes from:
//!
//! 1. A buy-now purchase with a pre-created intent reuses it, after the
//!    backend has been told the final shipping address.
//! 2. A signed-in user gets a fresh intent from the cart endpoint.
//! 3. A guest on the guest checkout page gets one from the guest endpoint.
//! 4. A guest on the regular cart checkout is sent to the guest page.
//!
//! Anything else fails with [`ResolveError::NoPaymentMethodAvailable`]; the
//! payment provider is never called with an empty secret.

use thiserror::Error;
use tracing::instrument;

use glasshouse_core::{Address, PaymentIntentId};

use crate::api::{ApiError, CheckoutApi, IntentRequest, PaymentIntentResponse, UpdateIntentRequest};
use crate::auth::SessionToken;
use crate::cart::CartLineItem;
use crate::models::PresuppliedIntent;
use crate::payments::ClientSecret;

/// Errors that can occur while resolving a payable intent.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No session, no guest path and no pre-created intent.
    #[error("No payment method available")]
    NoPaymentMethodAvailable,

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// UI surface the checkout was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// Regular checkout of the cart.
    Cart,
    /// The dedicated guest checkout page.
    GuestCheckout,
    /// A single product bought from its product page.
    BuyNow,
}

/// Where a resolved intent came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSource {
    Presupplied,
    AuthenticatedCart,
    Guest,
}

/// A client secret ready to be confirmed.
#[derive(Debug, Clone)]
pub struct ResolvedIntent {
    pub client_secret: ClientSecret,
    pub intent_id: Option<PaymentIntentId>,
    pub source: IntentSource,
}

/// Result of [`resolve_intent`].
#[derive(Debug, Clone)]
pub enum Resolution {
    Intent(ResolvedIntent),
    /// Guest on the cart entry point; continue on the guest checkout page.
    RedirectToGuestCheckout,
}

/// Everything the resolver needs to know about the purchase.
#[derive(Debug, Clone, Copy)]
pub struct IntentContext<'a> {
    pub entry: EntryPoint,
    pub token: Option<&'a SessionToken>,
    pub items: &'a [CartLineItem],
    pub email: &'a str,
    pub shipping_address: &'a Address,
    pub presupplied: Option<&'a PresuppliedIntent>,
}

/// Resolve the client secret to confirm for this purchase.
///
/// # Errors
///
/// Returns [`ResolveError::NoPaymentMethodAvailable`] when no intent can be
/// created or reused, or when the backend hands back an empty secret, and
/// [`ResolveError::Api`] when a backend call fails.
#[instrument(skip(api, ctx), fields(entry = ?ctx.entry, signed_in = ctx.token.is_some()))]
pub async fn resolve_intent<A: CheckoutApi>(
    api: &A,
    ctx: IntentContext<'_>,
) -> Result<Resolution, ResolveError> {
    if let Some(intent) = ctx.presupplied {
        let secret = ClientSecret::new(intent.client_secret.as_str());
        if secret.is_empty() {
            return Err(ResolveError::NoPaymentMethodAvailable);
        }

        let update = UpdateIntentRequest {
            shipping_address: ctx.shipping_address.normalized(),
            email: Some(ctx.email.trim().to_string()).filter(|e| !e.is_empty()),
        };
        api.update_intent(ctx.token, &intent.id, &update).await?;

        tracing::debug!(intent_id = %intent.id, "Reusing pre-created payment intent");
        return Ok(Resolution::Intent(ResolvedIntent {
            client_secret: secret,
            intent_id: Some(intent.id.clone()),
            source: IntentSource::Presupplied,
        }));
    }

    let request = || IntentRequest::new(ctx.items, ctx.email, ctx.shipping_address);

    let (response, source) = match (ctx.token, ctx.entry) {
        (Some(token), _) => (
            api.create_cart_intent(token, &request()).await?,
            IntentSource::AuthenticatedCart,
        ),
        (None, EntryPoint::GuestCheckout) => (
            api.create_guest_intent(&request()).await?,
            IntentSource::Guest,
        ),
        (None, EntryPoint::Cart) => {
            tracing::debug!("Guest on cart checkout, redirecting to guest checkout");
            return Ok(Resolution::RedirectToGuestCheckout);
        }
        (None, EntryPoint::BuyNow) => {
            tracing::warn!("Buy-now checkout without a session or pre-created intent");
            return Err(ResolveError::NoPaymentMethodAvailable);
        }
    };

    into_resolved(response, source).map(Resolution::Intent)
}

fn into_resolved(
    response: PaymentIntentResponse,
    source: IntentSource,
) -> Result<ResolvedIntent, ResolveError> {
    let client_secret = ClientSecret::new(response.client_secret);
    if client_secret.is_empty() {
        tracing::error!(?source, "Backend returned an empty client secret");
        return Err(ResolveError::NoPaymentMethodAvailable);
    }

    let intent_id = response.payment_intent_id.or_else(|| client_secret.intent_id());
    Ok(ResolvedIntent {
        client_secret,
        intent_id,
        source,
    })
}
