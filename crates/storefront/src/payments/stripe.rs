//! Stripe payment intent confirmation.
//!
//! Mirrors what Stripe.js does in the browser: the intent's client secret
//! and raw card data are posted to the confirm endpoint, authenticated with
//! the publishable key.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use glasshouse_core::{PaymentIntentId, PaymentIntentStatus};

use super::{BillingDetails, CardDetails, ClientSecret, PaymentConfirmation, PaymentProvider, ProviderError};
use crate::config::StripeConfig;

/// Stripe API client holding a publishable key.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    publishable_key: SecretString,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            publishable_key: config.publishable_key.clone(),
        })
    }

    fn confirm_params(
        secret: &ClientSecret,
        card: &CardDetails,
        billing: &BillingDetails,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("client_secret", secret.expose().to_string()),
            ("payment_method_data[type]", "card".to_string()),
            (
                "payment_method_data[card][number]",
                card.number.expose_secret().to_string(),
            ),
            (
                "payment_method_data[card][exp_month]",
                card.exp_month.to_string(),
            ),
            (
                "payment_method_data[card][exp_year]",
                card.exp_year.to_string(),
            ),
            (
                "payment_method_data[card][cvc]",
                card.cvc.expose_secret().to_string(),
            ),
        ];

        if let Some(name) = &billing.name {
            params.push(("payment_method_data[billing_details][name]", name.clone()));
        }
        if let Some(email) = &billing.email {
            params.push(("payment_method_data[billing_details][email]", email.clone()));
        }

        let address = billing.address.normalized();
        params.push((
            "payment_method_data[billing_details][address][line1]",
            address.address_line1,
        ));
        if let Some(line2) = address.address_line2 {
            params.push(("payment_method_data[billing_details][address][line2]", line2));
        }
        params.extend([
            ("payment_method_data[billing_details][address][city]", address.city),
            ("payment_method_data[billing_details][address][state]", address.state),
            (
                "payment_method_data[billing_details][address][postal_code]",
                address.zip_code,
            ),
            ("payment_method_data[billing_details][address][country]", address.country),
        ]);

        params
    }
}

impl PaymentProvider for StripeClient {
    #[instrument(skip(self, secret, card, billing))]
    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        card: &CardDetails,
        billing: &BillingDetails,
    ) -> Result<PaymentConfirmation, ProviderError> {
        let intent_id = secret.intent_id().ok_or(ProviderError::InvalidClientSecret)?;
        let url = format!(
            "{}/v1/payment_intents/{}/confirm",
            self.api_base,
            urlencoding::encode(intent_id.as_str())
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.publishable_key.expose_secret())
            .form(&Self::confirm_params(secret, card, billing))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &body));
        }

        let intent: IntentResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        tracing::info!(intent_id = %intent.id, status = ?intent.status, "Payment intent confirmed");

        Ok(PaymentConfirmation {
            intent_id: intent.id,
            status: intent.status,
        })
    }
}

/// Map a Stripe error body to a [`ProviderError`].
fn parse_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error:
                ErrorBody {
                    message: Some(message),
                    code,
                    decline_code,
                },
        }) => ProviderError::Declined {
            message,
            code,
            decline_code,
        },
        _ => ProviderError::Api {
            status,
            message: body.to_string(),
        },
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: PaymentIntentId,
    status: PaymentIntentStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use glasshouse_core::Address;

    use super::*;

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"error":{"type":"card_error","code":"card_declined","decline_code":"insufficient_funds","message":"Your card has insufficient funds."}}"#;
        match parse_error(402, body) {
            ProviderError::Declined {
                message,
                code,
                decline_code,
            } => {
                assert_eq!(message, "Your card has insufficient funds.");
                assert_eq!(code.as_deref(), Some("card_declined"));
                assert_eq!(decline_code.as_deref(), Some("insufficient_funds"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_without_message() {
        assert!(matches!(
            parse_error(500, "upstream timeout"),
            ProviderError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_confirm_params() {
        let card = CardDetails {
            number: SecretString::from("4242424242424242"),
            exp_month: 4,
            exp_year: 2031,
            cvc: SecretString::from("321"),
        };
        let billing = BillingDetails {
            name: None,
            email: Some("buyer@example.com".to_string()),
            address: Address {
                address_line1: " 1 Main St ".to_string(),
                city: "Brooklyn".to_string(),
                state: "ny".to_string(),
                zip_code: "11201".to_string(),
                ..Address::default()
            },
        };

        let params =
            StripeClient::confirm_params(&ClientSecret::new("pi_1_secret_x"), &card, &billing);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("client_secret"), Some("pi_1_secret_x"));
        assert_eq!(get("payment_method_data[card][exp_month]"), Some("4"));
        assert_eq!(
            get("payment_method_data[billing_details][address][state]"),
            Some("NY")
        );
        assert_eq!(
            get("payment_method_data[billing_details][address][line1]"),
            Some("1 Main St")
        );
        assert_eq!(
            get("payment_method_data[billing_details][address][postal_code]"),
            Some("11201")
        );
        assert_eq!(get("payment_method_data[billing_details][name]"), None);
    }
}
