//! Integration test harness for Glasshouse checkout.
//!
//! [`MockBackend`] serves the backend API routes the storefront calls, plus
//! the Stripe payment intent confirm route, on an ephemeral local port. Every
//! request is recorded so tests can assert on paths, headers and bodies.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p glasshouse-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use glasshouse_storefront::config::StripeConfig;

/// Publishable key handed to clients of the mock Stripe route.
pub const TEST_PUBLISHABLE_KEY: &str = "pk_test_51HqLy2KmZ8vXbN3pQrStUvWx";

/// Token the mock backend treats as expired.
pub const EXPIRED_TOKEN: &str = "expired";

/// How the mock backend answers.
#[derive(Debug, Clone)]
pub struct Behavior {
    /// Fail intent creation with this status.
    pub intent_failure: Option<u16>,
    /// Decline every card with this message.
    pub decline_message: Option<String>,
    /// Status reported by a successful confirm.
    pub confirm_status: String,
    /// Body returned by the address list route.
    pub addresses: Value,
    /// Fail address saves with this status.
    pub save_address_failure: Option<u16>,
    /// Body returned by the pay-later route.
    pub pay_later_body: String,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            intent_failure: None,
            decline_message: None,
            confirm_status: "succeeded".to_string(),
            addresses: json!([]),
            save_address_failure: None,
            pay_later_body: r#"{"requestId":"plr_1"}"#.to_string(),
        }
    }
}

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `Null` for non-JSON bodies.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Shared {
    behavior: Mutex<Behavior>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Shared {
    fn behavior(&self) -> Behavior {
        self.behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: String) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method,
                path,
                authorization,
                body,
            });
    }

    fn intent_reply(&self, intent_id: &str) -> Reply {
        if let Some(status) = self.behavior().intent_failure {
            return error_reply(status, "Could not create payment intent");
        }
        (
            StatusCode::OK,
            Json(json!({
                "clientSecret": format!("{intent_id}_secret_test"),
                "paymentIntentId": intent_id,
            })),
        )
    }
}

type Reply = (StatusCode, Json<Value>);

fn error_reply(status: u16, message: &str) -> Reply {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "error": message })),
    )
}

/// The bearer token, unless missing or expired.
fn valid_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| *token != EXPIRED_TOKEN)
}

/// Backend API and Stripe stand-in running on a local port.
pub struct MockBackend {
    base_url: Url,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend with the default behavior.
    ///
    /// # Errors
    ///
    /// Returns error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        Self::with_behavior(Behavior::default()).await
    }

    /// Start a backend that answers according to `behavior`.
    ///
    /// # Errors
    ///
    /// Returns error if no local port can be bound.
    pub async fn with_behavior(behavior: Behavior) -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            behavior: Mutex::new(behavior),
            requests: Mutex::default(),
        });

        let app = router(Arc::clone(&shared));
        let server = tokio::spawn(async move {
            // Aborted on drop
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)?;
        Ok(Self {
            base_url,
            shared,
            server,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Stripe configuration pointing at this backend.
    #[must_use]
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            publishable_key: SecretString::from(TEST_PUBLISHABLE_KEY.to_string()),
            api_base: self.base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Change how later requests are answered.
    pub fn update_behavior(&self, change: impl FnOnce(&mut Behavior)) {
        change(
            &mut self
                .shared
                .behavior
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests whose path starts with `prefix`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path.starts_with(prefix))
            .collect()
    }

    /// Paths of every request received so far, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(shared: Arc<Shared>) -> Router {
    Router::new()
        .route("/api/products/checkout/cart", post(cart_intent))
        .route("/api/products/checkout/guest", post(guest_intent))
        .route(
            "/api/products/payment-intent/{id}/update",
            post(update_intent),
        )
        .route("/api/products/pay-later", post(pay_later))
        .route("/api/users/addresses", post(save_address).get(list_addresses))
        .route("/v1/payment_intents/{id}/confirm", post(confirm_intent))
        .with_state(shared)
}

async fn cart_intent(State(shared): State<Arc<Shared>>, headers: HeaderMap, body: String) -> Reply {
    shared.record("POST", "/api/products/checkout/cart".to_string(), &headers, body);
    if valid_bearer(&headers).is_none() {
        return error_reply(401, "Not signed in");
    }
    shared.intent_reply("pi_cart_1")
}

async fn guest_intent(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    shared.record("POST", "/api/products/checkout/guest".to_string(), &headers, body);
    shared.intent_reply("pi_guest_1")
}

async fn update_intent(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    shared.record(
        "POST",
        format!("/api/products/payment-intent/{id}/update"),
        &headers,
        body,
    );
    (StatusCode::OK, Json(json!({ "updated": true })))
}

async fn pay_later(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    shared.record("POST", "/api/products/pay-later".to_string(), &headers, body);
    (StatusCode::OK, shared.behavior().pay_later_body)
}

async fn list_addresses(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Reply {
    shared.record("GET", "/api/users/addresses".to_string(), &headers, String::new());
    if valid_bearer(&headers).is_none() {
        return error_reply(401, "Not signed in");
    }
    (StatusCode::OK, Json(shared.behavior().addresses))
}

async fn save_address(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    shared.record("POST", "/api/users/addresses".to_string(), &headers, body);
    if valid_bearer(&headers).is_none() {
        return error_reply(401, "Not signed in");
    }
    if let Some(status) = shared.behavior().save_address_failure {
        return error_reply(status, "Address book is full");
    }
    (StatusCode::CREATED, Json(json!({ "id": "addr_new" })))
}

async fn confirm_intent(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    shared.record("POST", format!("/v1/payment_intents/{id}/confirm"), &headers, body);

    let behavior = shared.behavior();
    if let Some(message) = behavior.decline_message {
        return (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({
                "error": {
                    "type": "card_error",
                    "message": message,
                    "code": "card_declined",
                    "decline_code": "generic_decline",
                }
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "id": id, "status": behavior.confirm_status })),
    )
}
