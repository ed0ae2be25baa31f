//! Glasshouse Core - Shared types library.
//!
//! This crate provides common types used across all Glasshouse components:
//! - `storefront` - Cart store, shipping eligibility and checkout orchestration
//! - `cli` - Command-line harness for the cart and checkout flow
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, ZIP codes, addresses
//!   and checkout statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
