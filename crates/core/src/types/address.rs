//! Postal address types.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// Country applied when an address does not name one.
pub const DEFAULT_COUNTRY: &str = "US";

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// A shipping or billing address as entered at checkout.
///
/// Fields hold raw form input; validation happens at the checkout step
/// transitions, not on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street address.
    pub address_line1: String,
    /// Apartment, suite, unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: default_country(),
        }
    }
}

impl Address {
    /// Copy of the address with every field trimmed and an empty second line
    /// dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self
                .address_line2
                .as_deref()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_uppercase(),
            zip_code: self.zip_code.trim().to_string(),
            country: if self.country.trim().is_empty() {
                default_country()
            } else {
                self.country.trim().to_string()
            },
        }
    }

    /// Format the address as a single line.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        let mut parts = Vec::new();

        for part in [
            Some(self.address_line1.as_str()),
            self.address_line2.as_deref(),
            Some(self.city.as_str()),
        ]
        .into_iter()
        .flatten()
        {
            if !part.trim().is_empty() {
                parts.push(part.trim().to_string());
            }
        }

        let state_zip = format!("{} {}", self.state.trim(), self.zip_code.trim());
        if !state_zip.trim().is_empty() {
            parts.push(state_zip.trim().to_string());
        }

        parts.join(", ")
    }
}

/// An address stored on the user's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: AddressId,
    #[serde(flatten)]
    pub address: Address,
    #[serde(default)]
    pub is_primary: bool,
}
