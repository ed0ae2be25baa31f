//! Cart line items and their identity.

use serde::{Deserialize, Serialize};

use glasshouse_core::{Dimensions, Price, ProductId};

/// One entry in the cart: a product / variant / dimension combination and
/// its quantity.
///
/// Serialized in camelCase because the durable copy is shared with the web
/// storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    /// `None` is the product's default variant.
    #[serde(default)]
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: u64,
    pub product_name: String,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub product_slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Custom size for made-to-order items.
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

impl CartLineItem {
    /// Identity of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            variant_name: self.variant_name.clone(),
            dimensions: self.dimensions,
        }
    }

    #[must_use]
    pub fn line_total_cents(&self) -> u64 {
        self.unit_price_cents
            .saturating_mul(u64::from(self.quantity))
    }

    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.unit_price_cents)
    }

    /// Whether this line has the identity `key`.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id
            && self.variant_name == key.variant_name
            && self.dimensions.map(Dimensions::normalize) == key.dimensions.map(Dimensions::normalize)
    }
}

/// The identity tuple `(product_id, variant_name, height, width)` of a cart
/// line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_name: Option<String>,
    pub dimensions: Option<Dimensions>,
}

impl LineKey {
    /// Key for a stock (not made-to-order) line.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, variant_name: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_name: variant_name.map(str::to_string),
            dimensions: None,
        }
    }

    /// Same key with custom dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line() -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new("pivot-door"),
            variant_name: Some("Walnut".to_string()),
            quantity: 3,
            unit_price_cents: 125_000,
            product_name: "Pivot Door".to_string(),
            product_image: None,
            product_slug: Some("pivot-door".to_string()),
            category: Some("doors".to_string()),
            dimensions: Some(Dimensions::new(Decimal::new(96, 0), Decimal::new(36, 0))),
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line().line_total_cents(), 375_000);
        assert_eq!(line().unit_price().display(), "$1250.00");
    }

    #[test]
    fn test_matches_ignores_decimal_scale() {
        let key = LineKey::new("pivot-door", Some("Walnut"))
            .with_dimensions(Dimensions::new(Decimal::new(960, 1), Decimal::new(3600, 2)));
        assert!(line().matches(&key));
    }

    #[test]
    fn test_matches_requires_dimensions() {
        let key = LineKey::new("pivot-door", Some("Walnut"));
        assert!(!line().matches(&key));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(line()).unwrap();
        assert_eq!(json["productId"], "pivot-door");
        assert_eq!(json["unitPriceCents"], 125_000);
        assert_eq!(json["dimensions"]["height"], "96");
    }
}
