//! Status enums for the checkout flow.

use serde::{Deserialize, Serialize};

/// Step of the checkout wizard.
///
/// The discriminants are the wire/display indices used by the storefront
/// (`Contact = 0`, `Shipping = 1`, `Payment = 2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Contact = 0,
    Shipping = 1,
    Payment = 2,
}

impl CheckoutStep {
    /// Zero-based index of the step.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The step after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Contact => Some(Self::Shipping),
            Self::Shipping => Some(Self::Payment),
            Self::Payment => None,
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::Shipping => write!(f, "shipping"),
            Self::Payment => write!(f, "payment"),
        }
    }
}

/// Payment intent status as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl PaymentIntentStatus {
    /// Whether the charge went through (or is authorized for capture).
    #[must_use]
    pub const fn is_successful(self) -> bool {
        matches!(self, Self::Succeeded | Self::RequiresCapture | Self::Processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_indices_and_order() {
        assert_eq!(CheckoutStep::Contact.index(), 0);
        assert_eq!(CheckoutStep::Shipping.index(), 1);
        assert_eq!(CheckoutStep::Payment.index(), 2);
        assert!(CheckoutStep::Contact < CheckoutStep::Payment);
        assert_eq!(CheckoutStep::Shipping.next(), Some(CheckoutStep::Payment));
        assert_eq!(CheckoutStep::Payment.next(), None);
    }

    #[test]
    fn test_payment_status_success() {
        assert!(PaymentIntentStatus::Succeeded.is_successful());
        assert!(PaymentIntentStatus::Processing.is_successful());
        assert!(!PaymentIntentStatus::RequiresAction.is_successful());
        assert!(!PaymentIntentStatus::Canceled.is_successful());
    }
}
