//! In-memory fakes of the backend and payment provider for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use tokio::sync::oneshot;

use glasshouse_core::{
    AddressId, PayLaterRequestId, PaymentIntentId, PaymentIntentStatus, SavedAddress,
};

use crate::api::{
    ApiError, CheckoutApi, IntentRequest, PayLaterRequest, PayLaterResponse,
    PaymentIntentResponse, SaveAddressRequest, UpdateIntentRequest,
};
use crate::auth::SessionToken;
use crate::payments::{
    BillingDetails, CardDetails, ClientSecret, PaymentConfirmation, PaymentProvider,
    ProviderError,
};

fn server_error() -> ApiError {
    ApiError::Api {
        status: 500,
        message: "boom".to_string(),
    }
}

pub struct FakeApi {
    pub intent_secret: String,
    pub fail_intents: bool,
    pub fail_save_address: bool,
    pub fail_pay_later: bool,
    pub addresses: Vec<SavedAddress>,
    pub calls: Mutex<Vec<&'static str>>,
    pub last_intent: Mutex<Option<IntentRequest>>,
    pub last_update: Mutex<Option<UpdateIntentRequest>>,
    pub saved: Mutex<Vec<SaveAddressRequest>>,
    pub pay_later: Mutex<Vec<PayLaterRequest>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            intent_secret: "pi_cart_secret_test".to_string(),
            fail_intents: false,
            fail_save_address: false,
            fail_pay_later: false,
            addresses: Vec::new(),
            calls: Mutex::default(),
            last_intent: Mutex::default(),
            last_update: Mutex::default(),
            saved: Mutex::default(),
            pay_later: Mutex::default(),
        }
    }
}

#[allow(clippy::unwrap_used)]
impl FakeApi {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_intent(&self) -> Option<IntentRequest> {
        self.last_intent.lock().unwrap().clone()
    }

    pub fn last_update(&self) -> Option<UpdateIntentRequest> {
        self.last_update.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<SaveAddressRequest> {
        self.saved.lock().unwrap().clone()
    }

    pub fn pay_later_requests(&self) -> Vec<PayLaterRequest> {
        self.pay_later.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn intent(&self, request: &IntentRequest) -> Result<PaymentIntentResponse, ApiError> {
        *self.last_intent.lock().unwrap() = Some(request.clone());
        if self.fail_intents {
            return Err(server_error());
        }
        Ok(PaymentIntentResponse {
            client_secret: self.intent_secret.clone(),
            payment_intent_id: None,
        })
    }
}

#[allow(clippy::unwrap_used)]
impl CheckoutApi for FakeApi {
    async fn create_cart_intent(
        &self,
        _token: &SessionToken,
        request: &IntentRequest,
    ) -> Result<PaymentIntentResponse, ApiError> {
        self.record("create_cart_intent");
        self.intent(request)
    }

    async fn create_guest_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<PaymentIntentResponse, ApiError> {
        self.record("create_guest_intent");
        self.intent(request)
    }

    async fn update_intent(
        &self,
        _token: Option<&SessionToken>,
        _intent_id: &PaymentIntentId,
        request: &UpdateIntentRequest,
    ) -> Result<(), ApiError> {
        self.record("update_intent");
        *self.last_update.lock().unwrap() = Some(request.clone());
        Ok(())
    }

    async fn submit_pay_later(
        &self,
        _token: Option<&SessionToken>,
        request: &PayLaterRequest,
    ) -> Result<PayLaterResponse, ApiError> {
        self.record("submit_pay_later");
        self.pay_later.lock().unwrap().push(request.clone());
        if self.fail_pay_later {
            return Err(server_error());
        }
        Ok(PayLaterResponse {
            request_id: Some(PayLaterRequestId::new("plr_1")),
        })
    }

    async fn list_addresses(&self, _token: &SessionToken) -> Result<Vec<SavedAddress>, ApiError> {
        self.record("list_addresses");
        Ok(self.addresses.clone())
    }

    async fn save_address(
        &self,
        _token: &SessionToken,
        request: &SaveAddressRequest,
    ) -> Result<(), ApiError> {
        self.record("save_address");
        self.saved.lock().unwrap().push(request.clone());
        if self.fail_save_address {
            return Err(server_error());
        }
        Ok(())
    }
}

/// Provider that approves every card unless told to decline.
#[derive(Default)]
pub struct FakeProvider {
    pub decline_with: Option<String>,
    pub status: Option<PaymentIntentStatus>,
    /// When set, confirmation waits until the sender fires.
    pub gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub confirmed: Mutex<Vec<(String, BillingDetails)>>,
}

#[allow(clippy::unwrap_used)]
impl FakeProvider {
    pub fn declining(message: &str) -> Self {
        Self {
            decline_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Client secrets confirmed so far.
    pub fn confirmed_secrets(&self) -> Vec<String> {
        self.confirmed
            .lock()
            .unwrap()
            .iter()
            .map(|(secret, _)| secret.clone())
            .collect()
    }

    pub fn last_billing(&self) -> Option<BillingDetails> {
        self.confirmed
            .lock()
            .unwrap()
            .last()
            .map(|(_, billing)| billing.clone())
    }
}

#[allow(clippy::unwrap_used)]
impl PaymentProvider for FakeProvider {
    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        _card: &CardDetails,
        billing: &BillingDetails,
    ) -> Result<PaymentConfirmation, ProviderError> {
        self.confirmed
            .lock()
            .unwrap()
            .push((secret.expose().to_string(), billing.clone()));

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if let Some(message) = &self.decline_with {
            return Err(ProviderError::Declined {
                message: message.clone(),
                code: Some("card_declined".to_string()),
                decline_code: None,
            });
        }

        Ok(PaymentConfirmation {
            intent_id: secret
                .intent_id()
                .unwrap_or_else(|| PaymentIntentId::new("pi_unknown")),
            status: self.status.unwrap_or(PaymentIntentStatus::Succeeded),
        })
    }
}

/// A saved address in Brooklyn.
pub fn saved_address(id: &str, is_primary: bool) -> SavedAddress {
    SavedAddress {
        id: AddressId::new(id),
        address: glasshouse_core::Address {
            address_line1: format!("{id} Atlantic Ave"),
            city: "Brooklyn".to_string(),
            state: "NY".to_string(),
            zip_code: "11201".to_string(),
            ..glasshouse_core::Address::default()
        },
        is_primary,
    }
}
