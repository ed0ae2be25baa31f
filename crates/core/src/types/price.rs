//! Type-safe price representation.
//!
//! Prices travel through the cart and the backend as integer cents. The
//! decimal form is only produced for display.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Price {
    /// Amount in cents.
    pub cents: u64,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price from cents.
    #[must_use]
    pub const fn from_cents(cents: u64, currency_code: CurrencyCode) -> Self {
        Self {
            cents,
            currency_code,
        }
    }

    /// Create a USD price from cents.
    #[must_use]
    pub const fn usd(cents: u64) -> Self {
        Self::from_cents(cents, CurrencyCode::USD)
    }

    /// The amount in the currency's standard unit (e.g. dollars).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.cents) / Decimal::ONE_HUNDRED
    }

    /// Format for display (e.g. "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Lowercase code as payment providers expect it.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Price::usd(1999).display(), "$19.99");
        assert_eq!(Price::usd(500).display(), "$5.00");
        assert_eq!(Price::usd(7).display(), "$0.07");
    }

    #[test]
    fn test_display_other_currency() {
        let price = Price::from_cents(120_050, CurrencyCode::GBP);
        assert_eq!(price.to_string(), "£1200.50");
    }
}
