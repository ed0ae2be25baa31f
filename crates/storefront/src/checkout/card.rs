//! Card field validation for the payment step.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use secrecy::SecretString;

use glasshouse_core::ZipCode;

use crate::payments::CardDetails;
use crate::validation::{Field, FieldErrors};

/// `MM/YY` or `MM/YYYY`, whitespace already removed.
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/(\d{2}|\d{4})$").expect("Invalid regex"));

static CVC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("Invalid regex"));

/// Raw card form input.
#[derive(Clone, Default)]
pub struct CardInput {
    pub number: String,
    pub expiry: String,
    pub cvc: String,
    pub billing_zip: String,
}

impl std::fmt::Debug for CardInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardInput")
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvc", &"[REDACTED]")
            .field("billing_zip", &self.billing_zip)
            .finish()
    }
}

/// Card number with spaces and dashes removed.
fn card_digits(number: &str) -> String {
    number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Parse an expiry into `(month, four-digit year)`.
fn parse_expiry(expiry: &str) -> Option<(u8, u16)> {
    let compact: String = expiry.chars().filter(|c| !c.is_whitespace()).collect();
    let captures = EXPIRY_RE.captures(&compact)?;
    let month: u8 = captures.get(1)?.as_str().parse().ok()?;
    let year = captures.get(2)?.as_str();
    let year: u16 = match year.len() {
        2 => 2000 + year.parse::<u16>().ok()?,
        _ => year.parse().ok()?,
    };
    Some((month, year))
}

/// Validate the card fields as of `today`.
///
/// The card is good through the last day of its expiry month.
///
/// # Errors
///
/// Returns the per-field errors when any field is invalid.
pub fn validate_card(input: &CardInput, today: NaiveDate) -> Result<CardDetails, FieldErrors> {
    let mut errors = FieldErrors::new();

    let number = card_digits(&input.number);
    if number.is_empty() {
        errors.insert(Field::CardNumber, "Card number is required");
    } else if !(13..=19).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
        errors.insert(Field::CardNumber, "Enter a valid card number");
    }

    let expiry = if input.expiry.trim().is_empty() {
        errors.insert(Field::CardExpiry, "Expiration date is required");
        None
    } else {
        match parse_expiry(&input.expiry) {
            None => {
                errors.insert(Field::CardExpiry, "Use MM/YY or MM/YYYY");
                None
            }
            Some((month, year)) => {
                let current = (today.year(), today.month());
                if (i32::from(year), u32::from(month)) < current {
                    errors.insert(Field::CardExpiry, "Card has expired");
                    None
                } else {
                    Some((month, year))
                }
            }
        }
    };

    let cvc = input.cvc.trim();
    if cvc.is_empty() {
        errors.insert(Field::CardCvc, "Security code is required");
    } else if !CVC_RE.is_match(cvc) {
        errors.insert(Field::CardCvc, "Enter a 3 or 4 digit security code");
    }

    if !ZipCode::is_valid(&input.billing_zip) {
        errors.insert(Field::BillingZip, "Enter a valid billing ZIP code");
    }

    match expiry {
        Some((exp_month, exp_year)) if errors.is_empty() => Ok(CardDetails {
            number: SecretString::from(number),
            exp_month,
            exp_year,
            cvc: SecretString::from(cvc.to_string()),
        }),
        _ => Err(errors),
    }
}
