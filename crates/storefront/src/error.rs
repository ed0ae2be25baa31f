//! Unified error handling with Sentry integration.
//!
//! Most failures during checkout never surface as a [`CheckoutError`]: field
//! problems become [`FieldErrors`](crate::validation::FieldErrors) and
//! network or provider failures become the session's error message. What
//! remains here are misuse of the flow and failures of local resources.

use thiserror::Error;

use glasshouse_core::AddressId;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::resolver::ResolveError;
use crate::config::ConfigError;
use crate::payments::ProviderError;
use crate::storage::StorageError;

/// Library-level error type for checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Local or session storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Provider(#[from] ProviderError),

    /// No payable intent could be resolved.
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The requested step change is not allowed from the current state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A submit is already in flight for this session.
    #[error("A submission is already in progress")]
    AlreadyProcessing,

    /// The selected saved address does not exist.
    #[error("Unknown saved address: {0}")]
    UnknownAddress(AddressId),
}

impl CheckoutError {
    /// Whether this error is worth an error report (as opposed to a user or
    /// flow mistake).
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Config(_) | Self::Resolve(ResolveError::Api(_)) => true,
            Self::Api(err) => !matches!(err, ApiError::Unauthorized),
            Self::Provider(err) => !matches!(err, ProviderError::Declined { .. }),
            Self::Cart(_)
            | Self::Resolve(ResolveError::NoPaymentMethodAvailable)
            | Self::InvalidTransition(_)
            | Self::AlreadyProcessing
            | Self::UnknownAddress(_) => false,
        }
    }

    /// Log the error, capturing it to Sentry when it is reportable.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Checkout error"
            );
        } else {
            tracing::info!(error = %self, "Checkout error");
        }
    }

    /// Message suitable for showing to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) | Self::Resolve(ResolveError::Api(err)) => err.user_message(),
            Self::Provider(err) => err.user_message(),
            Self::Resolve(ResolveError::NoPaymentMethodAvailable) => {
                "No payment method is available. Please sign in or continue as a guest."
                    .to_string()
            }
            Self::AlreadyProcessing => "Your payment is already being processed.".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::UnknownAddress(_) => "That address is no longer available.".to_string(),
            Self::Storage(_) | Self::Config(_) | Self::InvalidTransition(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
