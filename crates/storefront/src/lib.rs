//! Glasshouse Storefront library.
//!
//! Client-side checkout logic for the storefront: the persisted cart, the
//! restricted-shipping eligibility rules, the three-step checkout wizard and
//! the resolver that decides how a payable intent is obtained.
//!
//! Every collaborator (storage, auth session, backend API, payment provider)
//! is passed in explicitly so the flow can be driven from the CLI, from tests
//! or from any other front end.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod payments;
pub mod shipping;
pub mod storage;
pub mod validation;

pub use error::{CheckoutError, Result};
