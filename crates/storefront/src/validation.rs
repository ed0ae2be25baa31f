//! Field-level validation errors.
//!
//! Validation errors are non-fatal: they block progression to the next
//! checkout step and are cleared as soon as the user edits the offending
//! field.

use std::collections::BTreeMap;

use serde::Serialize;

/// A checkout form field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    AddressLine1,
    City,
    State,
    ZipCode,
    /// Destination is outside the restricted-shipping delivery area.
    ShippingArea,
    CardNumber,
    CardExpiry,
    CardCvc,
    BillingZip,
    BillingAddressLine1,
    BillingCity,
    BillingState,
    BillingZipCode,
}

impl Field {
    /// Key used for this field in serialized error maps.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::AddressLine1 => "address_line1",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zip_code",
            Self::ShippingArea => "shipping_area",
            Self::CardNumber => "card_number",
            Self::CardExpiry => "card_expiry",
            Self::CardCvc => "card_cvc",
            Self::BillingZip => "billing_zip",
            Self::BillingAddressLine1 => "billing_address_line1",
            Self::BillingCity => "billing_city",
            Self::BillingState => "billing_state",
            Self::BillingZipCode => "billing_zip_code",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing any previous message for the field.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Clear the error for one field.
    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Clear the errors for every field in `fields`.
    pub fn remove_all(&mut self, fields: &[Field]) {
        for field in fields {
            self.0.remove(field);
        }
    }

    /// Merge `other` into `self`, overwriting messages for shared fields.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Outcome of validating a group of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: FieldErrors,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<FieldErrors> for ValidationResult {
    fn from(errors: FieldErrors) -> Self {
        Self { errors }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_keys() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::AddressLine1, "Street address is required");
        errors.insert(Field::ShippingArea, "Outside delivery area");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["address_line1"], "Street address is required");
        assert_eq!(json["shipping_area"], "Outside delivery area");
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for field in [
            Field::Email,
            Field::ZipCode,
            Field::CardCvc,
            Field::BillingAddressLine1,
            Field::BillingZipCode,
        ] {
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json, field.as_str());
        }
    }

    #[test]
    fn test_remove_all() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::City, "x");
        errors.insert(Field::State, "y");
        errors.insert(Field::Email, "z");

        errors.remove_all(&[Field::City, Field::State]);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(Field::Email));
    }

    #[test]
    fn test_validation_result() {
        assert!(ValidationResult::default().is_valid());

        let mut errors = FieldErrors::new();
        errors.insert(Field::Email, "bad");
        assert!(!ValidationResult::from(errors).is_valid());
    }
}
