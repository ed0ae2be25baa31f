//! Request and response bodies for the backend checkout endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use glasshouse_core::{Address, PayLaterRequestId, PaymentIntentId, ProductId, SavedAddress};

use crate::cart::CartLineItem;

/// A cart line as sent to the backend when creating an intent.
///
/// Strings are trimmed and dimensions normalized so that equivalent carts
/// produce identical requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentLineItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: u64,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Decimal>,
}

impl From<&CartLineItem> for IntentLineItem {
    fn from(item: &CartLineItem) -> Self {
        let dimensions = item.dimensions.map(glasshouse_core::Dimensions::normalize);
        Self {
            product_id: ProductId::new(item.product_id.as_str().trim()),
            variant_name: item
                .variant_name
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            product_name: item.product_name.trim().to_string(),
            height: dimensions.map(|d| d.height),
            width: dimensions.map(|d| d.width),
        }
    }
}

/// Body of the cart and guest intent endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub items: Vec<IntentLineItem>,
    pub email: String,
    pub shipping_address: Address,
}

impl IntentRequest {
    /// Build a request from cart lines, normalizing each line and the
    /// address.
    #[must_use]
    pub fn new(items: &[CartLineItem], email: &str, shipping_address: &Address) -> Self {
        Self {
            items: items.iter().map(IntentLineItem::from).collect(),
            email: email.trim().to_string(),
            shipping_address: shipping_address.normalized(),
        }
    }
}

/// Body of the intent update endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIntentRequest {
    pub shipping_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A payable intent issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    #[serde(default)]
    pub payment_intent_id: Option<PaymentIntentId>,
}

/// Body of the pay-later endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayLaterRequest {
    pub email: String,
    pub shipping_address: Address,
    pub items: Vec<IntentLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Acknowledgement of a pay-later request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayLaterResponse {
    #[serde(default)]
    pub request_id: Option<PayLaterRequestId>,
}

/// Body of the save-address endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveAddressRequest {
    #[serde(flatten)]
    pub address: Address,
    pub is_primary: bool,
}

/// The address list endpoint answers either with a bare array or wrapped in
/// an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AddressListResponse {
    Bare(Vec<SavedAddress>),
    Wrapped { addresses: Vec<SavedAddress> },
}

impl From<AddressListResponse> for Vec<SavedAddress> {
    fn from(response: AddressListResponse) -> Self {
        match response {
            AddressListResponse::Bare(addresses)
            | AddressListResponse::Wrapped { addresses } => addresses,
        }
    }
}
