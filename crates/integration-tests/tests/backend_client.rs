//! Integration tests for the backend API and Stripe clients against the
//! mock backend.

#![allow(clippy::unwrap_used)]

use glasshouse_core::{Address, AddressId, PaymentIntentId, PaymentIntentStatus, ProductId};
use glasshouse_integration_tests::{EXPIRED_TOKEN, MockBackend};
use glasshouse_storefront::api::{
    ApiError, BackendClient, CheckoutApi, IntentLineItem, IntentRequest, PayLaterRequest,
    SaveAddressRequest, UpdateIntentRequest,
};
use glasshouse_storefront::auth::SessionToken;
use glasshouse_storefront::payments::{
    BillingDetails, CardDetails, ClientSecret, PaymentProvider, ProviderError, StripeClient,
};
use serde_json::json;

fn brooklyn() -> Address {
    Address {
        address_line1: "1 Court St".to_string(),
        city: "Brooklyn".to_string(),
        state: "NY".to_string(),
        zip_code: "11201".to_string(),
        ..Address::default()
    }
}

fn intent_request() -> IntentRequest {
    IntentRequest {
        items: vec![IntentLineItem {
            product_id: ProductId::new("door-1"),
            variant_name: Some("Black".to_string()),
            quantity: 1,
            unit_price_cents: 250_000,
            product_name: "Steel Pivot Door".to_string(),
            height: None,
            width: None,
        }],
        email: "jane@example.com".to_string(),
        shipping_address: brooklyn(),
    }
}

fn card() -> CardDetails {
    CardDetails {
        number: "4242424242424242".to_string().into(),
        exp_month: 12,
        exp_year: 2035,
        cvc: "123".to_string().into(),
    }
}

fn billing() -> BillingDetails {
    BillingDetails {
        name: None,
        email: Some("jane@example.com".to_string()),
        address: brooklyn(),
    }
}

// =============================================================================
// Backend API
// =============================================================================

#[tokio::test]
async fn test_cart_intent_sends_bearer_and_camel_case_body() {
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();

    let response = client
        .create_cart_intent(&SessionToken::new("tok_123"), &intent_request())
        .await
        .unwrap();

    assert_eq!(response.client_secret, "pi_cart_1_secret_test");
    assert_eq!(response.payment_intent_id, Some(PaymentIntentId::new("pi_cart_1")));

    let requests = backend.requests_to("/api/products/checkout/cart");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok_123"));

    let body = requests[0].json();
    assert_eq!(body["email"], "jane@example.com");
    assert_eq!(body["items"][0]["productId"], "door-1");
    assert_eq!(body["items"][0]["unitPriceCents"], 250_000);
    assert_eq!(body["shippingAddress"]["zip_code"], "11201");
}

#[tokio::test]
async fn test_guest_intent_is_anonymous() {
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();

    let response = client.create_guest_intent(&intent_request()).await.unwrap();

    assert_eq!(response.client_secret, "pi_guest_1_secret_test");
    let requests = backend.requests_to("/api/products/checkout/guest");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].authorization.is_none());
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();

    let err = client
        .create_cart_intent(&SessionToken::new(EXPIRED_TOKEN), &intent_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_server_error_carries_backend_message() {
    let backend = MockBackend::start().await.unwrap();
    backend.update_behavior(|b| b.intent_failure = Some(503));
    let client = BackendClient::new(backend.base_url().clone()).unwrap();

    let err = client.create_guest_intent(&intent_request()).await.unwrap_err();

    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Could not create payment intent");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_update_intent_targets_intent_path() {
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();

    client
        .update_intent(
            None,
            &PaymentIntentId::new("pi_buy_9"),
            &UpdateIntentRequest {
                shipping_address: brooklyn(),
                email: Some("jane@example.com".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(backend.paths(), ["/api/products/payment-intent/pi_buy_9/update"]);
    let body = backend.requests()[0].json();
    assert_eq!(body["shippingAddress"]["city"], "Brooklyn");
    assert_eq!(body["email"], "jane@example.com");
}

#[tokio::test]
async fn test_pay_later_returns_request_id() {
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();
    let request = PayLaterRequest {
        email: "jane@example.com".to_string(),
        shipping_address: brooklyn(),
        items: intent_request().items,
        message: Some("Please call before delivery".to_string()),
    };

    let response = client.submit_pay_later(None, &request).await.unwrap();
    assert_eq!(response.request_id.unwrap().as_str(), "plr_1");

    backend.update_behavior(|b| b.pay_later_body = String::new());
    let response = client.submit_pay_later(None, &request).await.unwrap();
    assert!(response.request_id.is_none());

    let body = backend.requests_to("/api/products/pay-later")[0].json();
    assert_eq!(body["message"], "Please call before delivery");
}

#[tokio::test]
async fn test_list_addresses_accepts_both_shapes() {
    let address = json!({
        "id": "addr_1",
        "address_line1": "1 Court St",
        "city": "Brooklyn",
        "state": "NY",
        "zip_code": "11201",
        "is_primary": true,
    });
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();
    let token = SessionToken::new("tok_123");

    backend.update_behavior(|b| b.addresses = json!([address.clone()]));
    let bare = client.list_addresses(&token).await.unwrap();

    backend.update_behavior(|b| b.addresses = json!({ "addresses": [address.clone()] }));
    let wrapped = client.list_addresses(&token).await.unwrap();

    assert_eq!(bare, wrapped);
    assert_eq!(bare.len(), 1);
    assert_eq!(bare[0].id, AddressId::new("addr_1"));
    assert!(bare[0].is_primary);
    assert_eq!(bare[0].address.country, "US");
}

#[tokio::test]
async fn test_save_address_posts_flat_body() {
    let backend = MockBackend::start().await.unwrap();
    let client = BackendClient::new(backend.base_url().clone()).unwrap();

    client
        .save_address(
            &SessionToken::new("tok_123"),
            &SaveAddressRequest {
                address: brooklyn(),
                is_primary: true,
            },
        )
        .await
        .unwrap();

    let request = &backend.requests_to("/api/users/addresses")[0];
    assert_eq!(request.method, "POST");
    let body = request.json();
    assert_eq!(body["address_line1"], "1 Court St");
    assert_eq!(body["is_primary"], true);
}

// =============================================================================
// Stripe
// =============================================================================

#[tokio::test]
async fn test_stripe_confirm_succeeds() {
    let backend = MockBackend::start().await.unwrap();
    let stripe = StripeClient::new(&backend.stripe_config()).unwrap();

    let confirmation = stripe
        .confirm_card_payment(&ClientSecret::new("pi_cart_1_secret_test"), &card(), &billing())
        .await
        .unwrap();

    assert_eq!(confirmation.intent_id, PaymentIntentId::new("pi_cart_1"));
    assert_eq!(confirmation.status, PaymentIntentStatus::Succeeded);

    let request = &backend.requests_to("/v1/payment_intents/pi_cart_1/confirm")[0];
    assert!(request.authorization.as_deref().unwrap().starts_with("Bearer pk_test_"));
    assert!(request.body.contains("client_secret=pi_cart_1_secret_test"));
    assert!(request.body.contains("payment_method_data%5Btype%5D=card"));
}

#[tokio::test]
async fn test_stripe_decline_is_user_facing() {
    let backend = MockBackend::start().await.unwrap();
    backend.update_behavior(|b| b.decline_message = Some("Your card was declined.".to_string()));
    let stripe = StripeClient::new(&backend.stripe_config()).unwrap();

    let err = stripe
        .confirm_card_payment(&ClientSecret::new("pi_cart_1_secret_test"), &card(), &billing())
        .await
        .unwrap_err();

    match &err {
        ProviderError::Declined {
            code, decline_code, ..
        } => {
            assert_eq!(code.as_deref(), Some("card_declined"));
            assert_eq!(decline_code.as_deref(), Some("generic_decline"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Your card was declined.");
}

#[tokio::test]
async fn test_stripe_rejects_malformed_secret_without_calling_out() {
    let backend = MockBackend::start().await.unwrap();
    let stripe = StripeClient::new(&backend.stripe_config()).unwrap();

    let err = stripe
        .confirm_card_payment(&ClientSecret::new("not-a-secret"), &card(), &billing())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::InvalidClientSecret));
    assert!(backend.requests().is_empty());
}
