//! Delivery-area check for restricted items.
//!
//! # Usage
//!
//! ```bash
//! glasshouse eligibility --city "Jersey City" --state NJ --zip 07302
//! ```

use glasshouse_core::ZipCode;
use glasshouse_storefront::shipping::{
    SHIPPING_AREA_MESSAGE, is_eligible_destination, requires_restricted_shipping,
};

use super::CommandError;
use super::cart::open_cart;

/// Report whether the destination is inside the delivery area, and whether
/// the current cart needs it to be.
#[allow(clippy::print_stdout)]
pub fn check(city: &str, state: &str, zip: &str) -> Result<(), CommandError> {
    if !ZipCode::is_valid(zip) {
        println!("{zip} is not a valid ZIP code.");
    }

    let eligible = is_eligible_destination(city, state, zip);
    tracing::debug!(city, state, zip, eligible, "Checked destination");

    if eligible {
        println!("{city}, {state} {zip} can receive doors, windows, and glass.");
    } else {
        println!("{city}, {state} {zip} is outside the delivery area for doors, windows, and glass.");
    }

    let cart = open_cart()?;
    if requires_restricted_shipping(&cart.items()) {
        if eligible {
            println!("Your cart can ship to this address.");
        } else {
            println!("{SHIPPING_AREA_MESSAGE}");
        }
    } else if !cart.is_empty() {
        println!("Your cart has no restricted items and can ship anywhere.");
    }

    Ok(())
}
