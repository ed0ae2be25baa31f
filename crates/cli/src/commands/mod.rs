//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod eligibility;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use glasshouse_storefront::CheckoutError;
use glasshouse_storefront::api::ApiError;
use glasshouse_storefront::cart::CartError;
use glasshouse_storefront::config::ConfigError;
use glasshouse_storefront::payments::ProviderError;
use glasshouse_storefront::storage::StorageError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Product {product} has no variant named {variant}")]
    UnknownVariant { product: String, variant: String },

    #[error("No matching line in the cart")]
    LineNotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Payment error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Checkout stopped at {step}: fix the fields listed above")]
    InvalidFields { step: String },

    #[error("{0}")]
    Failed(String),
}

/// Read a JSON document from disk.
fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CommandError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CommandError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}
