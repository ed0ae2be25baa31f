//! reqwest implementation of [`CheckoutApi`].

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use glasshouse_core::{PaymentIntentId, SavedAddress};

use super::types::AddressListResponse;
use super::{
    ApiError, CheckoutApi, IntentRequest, PayLaterRequest, PayLaterResponse,
    PaymentIntentResponse, SaveAddressRequest, UpdateIntentRequest,
};
use crate::auth::SessionToken;

const CART_INTENT_PATH: &str = "/api/products/checkout/cart";
const GUEST_INTENT_PATH: &str = "/api/products/checkout/guest";
const PAY_LATER_PATH: &str = "/api/products/pay-later";
const ADDRESSES_PATH: &str = "/api/users/addresses";

/// HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn post(&self, path: &str, token: Option<&SessionToken>) -> Result<RequestBuilder, ApiError> {
        let request = self.client.post(self.endpoint(path)?);
        Ok(match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        })
    }

    /// Send a request and check the status, returning the raw body.
    async fn execute(request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let body = Self::execute(request).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body. The backend answers
/// with `{"error": "..."}` or `{"message": "..."}`; anything else is passed
/// through verbatim.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

impl CheckoutApi for BackendClient {
    #[instrument(skip(self, token, request), fields(items = request.items.len()))]
    async fn create_cart_intent(
        &self,
        token: &SessionToken,
        request: &IntentRequest,
    ) -> Result<PaymentIntentResponse, ApiError> {
        Self::execute_json(self.post(CART_INTENT_PATH, Some(token))?.json(request)).await
    }

    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn create_guest_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<PaymentIntentResponse, ApiError> {
        Self::execute_json(self.post(GUEST_INTENT_PATH, None)?.json(request)).await
    }

    #[instrument(skip(self, token, request))]
    async fn update_intent(
        &self,
        token: Option<&SessionToken>,
        intent_id: &PaymentIntentId,
        request: &UpdateIntentRequest,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/api/products/payment-intent/{}/update",
            urlencoding::encode(intent_id.as_str())
        );
        Self::execute(self.post(&path, token)?.json(request)).await?;
        Ok(())
    }

    #[instrument(skip(self, token, request))]
    async fn submit_pay_later(
        &self,
        token: Option<&SessionToken>,
        request: &PayLaterRequest,
    ) -> Result<PayLaterResponse, ApiError> {
        let body = Self::execute(self.post(PAY_LATER_PATH, token)?.json(request)).await?;
        if body.trim().is_empty() {
            return Ok(PayLaterResponse::default());
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    #[instrument(skip(self, token))]
    async fn list_addresses(&self, token: &SessionToken) -> Result<Vec<SavedAddress>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(ADDRESSES_PATH)?)
            .bearer_auth(token.expose());
        let response: AddressListResponse = Self::execute_json(request).await?;
        Ok(response.into())
    }

    #[instrument(skip(self, token, request), fields(is_primary = request.is_primary))]
    async fn save_address(
        &self,
        token: &SessionToken,
        request: &SaveAddressRequest,
    ) -> Result<(), ApiError> {
        Self::execute(self.post(ADDRESSES_PATH, Some(token))?.json(request)).await?;
        Ok(())
    }
}
