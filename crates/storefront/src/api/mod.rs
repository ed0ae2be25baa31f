//! Backend JSON API used by checkout.
//!
//! All endpoints take and return JSON and are bearer-authenticated when the
//! user has a session.

mod client;
mod types;

pub use client::BackendClient;
pub use types::{
    IntentLineItem, IntentRequest, PayLaterRequest, PayLaterResponse, PaymentIntentResponse,
    SaveAddressRequest, UpdateIntentRequest,
};

use std::future::Future;

use thiserror::Error;

use glasshouse_core::{PaymentIntentId, SavedAddress};

use crate::auth::SessionToken;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The session token was missing or rejected.
    #[error("Not authorized")]
    Unauthorized,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Message suitable for showing to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Api { status, message } if *status < 500 && !message.trim().is_empty() => {
                message.clone()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// The backend checkout endpoints.
pub trait CheckoutApi: Send + Sync {
    /// `POST /api/products/checkout/cart`: create an intent for a signed-in
    /// user's cart.
    fn create_cart_intent(
        &self,
        token: &SessionToken,
        request: &IntentRequest,
    ) -> impl Future<Output = Result<PaymentIntentResponse, ApiError>> + Send;

    /// `POST /api/products/checkout/guest`: create an intent without a
    /// session.
    fn create_guest_intent(
        &self,
        request: &IntentRequest,
    ) -> impl Future<Output = Result<PaymentIntentResponse, ApiError>> + Send;

    /// `POST /api/products/payment-intent/{id}/update`: attach the final
    /// shipping address to an existing intent.
    fn update_intent(
        &self,
        token: Option<&SessionToken>,
        intent_id: &PaymentIntentId,
        request: &UpdateIntentRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /api/products/pay-later`: record a request for manual follow-up.
    fn submit_pay_later(
        &self,
        token: Option<&SessionToken>,
        request: &PayLaterRequest,
    ) -> impl Future<Output = Result<PayLaterResponse, ApiError>> + Send;

    /// `GET /api/users/addresses`: the signed-in user's saved addresses.
    fn list_addresses(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Vec<SavedAddress>, ApiError>> + Send;

    /// `POST /api/users/addresses`: save an address to the user's account.
    fn save_address(
        &self,
        token: &SessionToken,
        request: &SaveAddressRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
