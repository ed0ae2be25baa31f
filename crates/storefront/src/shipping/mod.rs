//! Shipping eligibility and address validation.
//!
//! Validation here is pure: it is invoked at checkout transition points and
//! re-evaluated on every call, so an address edit is always checked against
//! the current cart contents.

mod eligibility;

pub use eligibility::{is_eligible_destination, requires_restricted_shipping};

use glasshouse_core::{Address, ZipCode};

use crate::cart::CartLineItem;
use crate::validation::{Field, FieldErrors, ValidationResult};

/// Message attached to [`Field::ShippingArea`] when a restricted cart is
/// headed outside the delivery area.
pub const SHIPPING_AREA_MESSAGE: &str = "Doors, windows, and glass can only be delivered within \
     New York City, Long Island, Westchester, and Jersey City. Please use an address in our \
     delivery area or remove those items from your cart.";

/// Fields an address check reports against.
struct AddressFields {
    line1: Field,
    city: Field,
    state: Field,
    zip: Field,
}

const SHIPPING_FIELDS: AddressFields = AddressFields {
    line1: Field::AddressLine1,
    city: Field::City,
    state: Field::State,
    zip: Field::ZipCode,
};

const BILLING_FIELDS: AddressFields = AddressFields {
    line1: Field::BillingAddressLine1,
    city: Field::BillingCity,
    state: Field::BillingState,
    zip: Field::BillingZipCode,
};

fn check_address(address: &Address, fields: &AddressFields) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if address.address_line1.trim().is_empty() {
        errors.insert(fields.line1, "Street address is required");
    }
    if address.city.trim().is_empty() {
        errors.insert(fields.city, "City is required");
    }
    if address.state.trim().is_empty() {
        errors.insert(fields.state, "State is required");
    }

    let zip = address.zip_code.trim();
    if zip.is_empty() {
        errors.insert(fields.zip, "ZIP code is required");
    } else if !ZipCode::is_valid(zip) {
        errors.insert(fields.zip, "Enter a valid ZIP code (12345 or 12345-6789)");
    }

    errors
}

/// Validate a shipping address for the given cart contents.
///
/// Required fields and the ZIP pattern are checked first. Only when those
/// pass and the cart holds a restricted category is the destination checked
/// against the delivery area, reported as [`Field::ShippingArea`].
#[must_use]
pub fn validate_shipping_address(address: &Address, items: &[CartLineItem]) -> ValidationResult {
    let mut errors = check_address(address, &SHIPPING_FIELDS);

    if errors.is_empty()
        && requires_restricted_shipping(items)
        && !is_eligible_destination(&address.city, &address.state, &address.zip_code)
    {
        tracing::debug!(
            city = %address.city,
            state = %address.state,
            "Restricted cart outside delivery area"
        );
        errors.insert(Field::ShippingArea, SHIPPING_AREA_MESSAGE);
    }

    errors.into()
}

/// Validate a billing address. Billing has no delivery area restriction.
#[must_use]
pub fn validate_billing_address(address: &Address) -> ValidationResult {
    check_address(address, &BILLING_FIELDS).into()
}

#[cfg(test)]
mod tests {
    use glasshouse_core::ProductId;

    use super::*;

    fn address(city: &str, state: &str, zip: &str) -> Address {
        Address {
            address_line1: "1 Main St".to_string(),
            city: city.to_string(),
            state: state.to_string(),
            zip_code: zip.to_string(),
            ..Address::default()
        }
    }

    fn line(category: &str) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new("item"),
            variant_name: None,
            quantity: 1,
            unit_price_cents: 10_000,
            product_name: "Item".to_string(),
            product_image: None,
            product_slug: None,
            category: Some(category.to_string()),
            dimensions: None,
        }
    }

    #[test]
    fn test_required_fields() {
        let result = validate_shipping_address(&Address::default(), &[]);
        assert!(!result.is_valid());
        for field in [Field::AddressLine1, Field::City, Field::State, Field::ZipCode] {
            assert!(result.errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_whitespace_is_missing() {
        let result = validate_shipping_address(&address("   ", "NY", "11201"), &[]);
        assert!(result.errors.contains(Field::City));
    }

    #[test]
    fn test_zip_pattern() {
        assert!(validate_shipping_address(&address("Austin", "TX", "78701-1234"), &[]).is_valid());
        let result = validate_shipping_address(&address("Austin", "TX", "7870"), &[]);
        assert!(result.errors.contains(Field::ZipCode));
    }

    #[test]
    fn test_unrestricted_cart_ships_anywhere() {
        let items = [line("hardware")];
        assert!(validate_shipping_address(&address("Los Angeles", "CA", "90001"), &items).is_valid());
    }

    #[test]
    fn test_restricted_cart_outside_area() {
        let items = [line("doors")];
        let result = validate_shipping_address(&address("Los Angeles", "CA", "90001"), &items);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors.get(Field::ShippingArea), Some(SHIPPING_AREA_MESSAGE));
    }

    #[test]
    fn test_restricted_cart_inside_area() {
        let items = [line("doors")];
        assert!(validate_shipping_address(&address("Brooklyn", "NY", "11201"), &items).is_valid());
    }

    #[test]
    fn test_area_check_waits_for_base_fields() {
        let items = [line("glass")];
        let result = validate_shipping_address(&address("Los Angeles", "CA", ""), &items);
        assert!(result.errors.contains(Field::ZipCode));
        assert!(!result.errors.contains(Field::ShippingArea));
    }

    #[test]
    fn test_billing_uses_billing_fields() {
        let result = validate_billing_address(&address("Los Angeles", "", "bad"));
        assert!(result.errors.contains(Field::BillingState));
        assert!(result.errors.contains(Field::BillingZipCode));
        assert!(!result.errors.contains(Field::State));

        assert!(validate_billing_address(&address("Los Angeles", "CA", "90001")).is_valid());
    }
}
