//! Catalog product types.

use serde::{Deserialize, Serialize};

use glasshouse_core::ProductId;

/// A catalog product as seen by the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL slug, used for restricted-category detection when no category is
    /// set.
    #[serde(default)]
    pub slug: Option<String>,
    /// Catalog category (e.g. `doors`, `hardware`).
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Base price, used when no variant is selected.
    pub price_cents: u64,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// Look up a variant by name.
    #[must_use]
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// A purchasable variant of a product (finish, size, glazing...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub price_cents: u64,
}
