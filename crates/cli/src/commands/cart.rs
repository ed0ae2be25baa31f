//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! glasshouse cart add --product product.json --variant Walnut --quantity 2
//! glasshouse cart list
//! glasshouse cart update --product-id door-1 --variant Walnut --quantity 3
//! glasshouse cart remove --product-id door-1 --variant Walnut
//! glasshouse cart clear
//! ```
//!
//! # Environment Variables
//!
//! - `GLASSHOUSE_STORAGE_DIR` - Directory holding the persisted cart

use std::path::Path;
use std::sync::Arc;

use glasshouse_core::{Dimensions, Price};
use glasshouse_storefront::cart::{CartStore, LineKey};
use glasshouse_storefront::config::storage_dir_from_env;
use glasshouse_storefront::models::Product;
use glasshouse_storefront::shipping::requires_restricted_shipping;
use glasshouse_storefront::storage::FileStore;

use super::{CommandError, read_json_file};

/// Open the persisted cart.
pub(crate) fn open_cart() -> Result<CartStore, CommandError> {
    let dir = storage_dir_from_env();
    tracing::debug!(dir = %dir.display(), "Opening cart storage");
    Ok(CartStore::load(Arc::new(FileStore::open(dir)?)))
}

/// Add a product read from a JSON file.
pub fn add(
    product_path: &Path,
    variant: Option<&str>,
    quantity: u32,
    dimensions: Option<Dimensions>,
) -> Result<(), CommandError> {
    let product: Product = read_json_file(product_path)?;
    let cart = open_cart()?;
    add_product(&cart, &product, variant, quantity, dimensions)?;
    print_cart(&cart);
    Ok(())
}

fn add_product(
    cart: &CartStore,
    product: &Product,
    variant: Option<&str>,
    quantity: u32,
    dimensions: Option<Dimensions>,
) -> Result<(), CommandError> {
    let variant = variant
        .map(|name| {
            product
                .variant(name)
                .ok_or_else(|| CommandError::UnknownVariant {
                    product: product.id.to_string(),
                    variant: name.to_string(),
                })
        })
        .transpose()?;

    cart.add_item(product, variant, quantity, dimensions)?;
    tracing::info!(product_id = %product.id, quantity, "Added to cart");
    Ok(())
}

pub fn list() -> Result<(), CommandError> {
    print_cart(&open_cart()?);
    Ok(())
}

/// Set a line's quantity. Zero or less removes the line.
pub fn update(key: &LineKey, quantity: i64) -> Result<(), CommandError> {
    let cart = open_cart()?;
    update_line(&cart, key, quantity)?;
    print_cart(&cart);
    Ok(())
}

fn update_line(cart: &CartStore, key: &LineKey, quantity: i64) -> Result<(), CommandError> {
    if !cart.items().iter().any(|line| line.matches(key)) {
        return Err(CommandError::LineNotFound);
    }
    cart.update_quantity(key, quantity)?;
    Ok(())
}

pub fn remove(key: &LineKey) -> Result<(), CommandError> {
    let cart = open_cart()?;
    if !cart.remove_item(key) {
        return Err(CommandError::LineNotFound);
    }
    print_cart(&cart);
    Ok(())
}

pub fn clear() -> Result<(), CommandError> {
    open_cart()?.clear();
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &CartStore) {
    let items = cart.items();
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in &items {
        let mut label = line.product_name.clone();
        if let Some(variant) = &line.variant_name {
            label.push_str(&format!(" ({variant})"));
        }
        if let Some(size) = &line.dimensions {
            label.push_str(&format!(" {size}"));
        }
        println!(
            "{:>3} x {label:<48} {:>12}  [{}]",
            line.quantity,
            Price::usd(line.line_total_cents()).display(),
            line.product_id
        );
    }

    println!("{} item(s), total {}", cart.item_count(), Price::usd(cart.total_cents()).display());
    if requires_restricted_shipping(&items) {
        println!("Contains doors or windows: delivery is limited to the NYC metro area.");
    }
}
