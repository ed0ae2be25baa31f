//! Core types for Glasshouse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod dimensions;
pub mod email;
pub mod id;
pub mod price;
pub mod status;
pub mod zip;

pub use address::{Address, SavedAddress, DEFAULT_COUNTRY};
pub use dimensions::Dimensions;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use zip::{ZipCode, ZipCodeError};
