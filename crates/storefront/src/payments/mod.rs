//! Payment provider boundary.
//!
//! Card data is handed straight to the provider together with the client
//! secret of a payment intent created by the backend. Tokenization,
//! authentication challenges and capture all happen on the provider side.

mod stripe;

pub use stripe::StripeClient;

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use glasshouse_core::{Address, PaymentIntentId, PaymentIntentStatus};

/// Errors returned by a payment provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the payment (declined card, bad CVC, ...).
    #[error("{message}")]
    Declined {
        message: String,
        code: Option<String>,
        decline_code: Option<String>,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error without a usable message.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The client secret does not name a payment intent.
    #[error("Malformed client secret")]
    InvalidClientSecret,
}

impl ProviderError {
    /// Message suitable for showing to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Declined { message, .. } => message.clone(),
            Self::Http(_) => {
                "We couldn't reach the payment processor. Please try again.".to_string()
            }
            Self::Api { .. } | Self::Parse(_) | Self::InvalidClientSecret => {
                "Payment failed. Please try again.".to_string()
            }
        }
    }
}

/// Opaque client secret identifying one payment intent.
#[derive(Clone)]
pub struct ClientSecret(SecretString);

impl ClientSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }

    /// Id of the intent this secret belongs to (`pi_123_secret_abc` belongs
    /// to `pi_123`).
    #[must_use]
    pub fn intent_id(&self) -> Option<PaymentIntentId> {
        self.0
            .expose_secret()
            .split_once("_secret_")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
            .map(PaymentIntentId::new)
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

/// Card fields collected at the payment step, already validated.
#[derive(Clone)]
pub struct CardDetails {
    pub number: SecretString,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: SecretString,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// Billing details attached to the payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Address,
}

/// Result of a successful confirmation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub intent_id: PaymentIntentId,
    pub status: PaymentIntentStatus,
}

/// A payment provider able to confirm a card payment against an intent.
pub trait PaymentProvider: Send + Sync {
    /// Confirm the intent identified by `secret` with the given card.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Declined`] with the provider's message when
    /// the payment is rejected, or a transport error.
    fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        card: &CardDetails,
        billing: &BillingDetails,
    ) -> impl Future<Output = Result<PaymentConfirmation, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_secret_intent_id() {
        let secret = ClientSecret::new("pi_3Nx_secret_abc");
        assert_eq!(secret.intent_id(), Some(PaymentIntentId::new("pi_3Nx")));
        assert!(ClientSecret::new("garbage").intent_id().is_none());
        assert!(ClientSecret::new(" ").is_empty());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = ClientSecret::new("pi_1_secret_hidden");
        assert!(!format!("{secret:?}").contains("hidden"));

        let card = CardDetails {
            number: SecretString::from("4242424242424242"),
            exp_month: 12,
            exp_year: 2030,
            cvc: SecretString::from("123"),
        };
        let debug = format!("{card:?}");
        assert!(!debug.contains("4242"));
        assert!(debug.contains("2030"));
    }

    #[test]
    fn test_declined_user_message() {
        let err = ProviderError::Declined {
            message: "Your card was declined.".to_string(),
            code: Some("card_declined".to_string()),
            decline_code: None,
        };
        assert_eq!(err.user_message(), "Your card was declined.");
        assert_eq!(err.to_string(), "Your card was declined.");
    }
}
