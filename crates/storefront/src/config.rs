//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GLASSHOUSE_API_BASE_URL` - Base URL of the backend API
//!
//! ## Optional
//! - `GLASSHOUSE_STORAGE_DIR` - Directory for durable local storage (default: .glasshouse)
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key (`pk_test_...` / `pk_live_...`)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `GLASSHOUSE_COMPLETE_REDIRECT` - Path to redirect to after payment (default: /order-confirmation)
//! - `GLASSHOUSE_REDIRECT_DELAY_SECS` - Delay before that redirect (default: 3)
//! - `GLASSHOUSE_GUEST_CHECKOUT_PATH` - Guest checkout page (default: /checkout/guest)
//! - `GLASSHOUSE_EMPTY_CART_REDIRECT` - Where an empty checkout is sent (default: /cart)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::checkout::CheckoutSettings;

const DEFAULT_STORAGE_DIR: &str = ".glasshouse";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Accepted publishable key prefixes.
const PUBLISHABLE_KEY_PREFIXES: &[&str] = &["pk_test_", "pk_live_"];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout client configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Backend API base URL
    pub api_base_url: Url,
    /// Directory holding the durable cart copy
    pub storage_dir: PathBuf,
    /// Stripe configuration, absent when card payments are disabled
    pub stripe: Option<StripeConfig>,
    /// Redirect targets and timing
    pub checkout: CheckoutSettings,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; reporting is disabled when unset
    pub dsn: Option<String>,
    /// Sentry environment name
    pub environment: Option<String>,
}

impl SentryConfig {
    /// Load Sentry settings on their own, so that commands which never talk
    /// to the backend still report errors.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
        }
    }
}

/// Stripe configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Publishable key used to confirm payment intents
    pub publishable_key: SecretString,
    /// API base URL, overridable for testing
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("publishable_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the Stripe key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "GLASSHOUSE_API_BASE_URL",
            &get_required_env("GLASSHOUSE_API_BASE_URL")?,
        )?;
        let storage_dir = storage_dir_from_env();
        let stripe = StripeConfig::from_env()?;
        let checkout = checkout_settings_from_env()?;

        Ok(Self {
            api_base_url,
            storage_dir,
            stripe,
            checkout,
            sentry: SentryConfig::from_env(),
        })
    }

    /// Stripe configuration, or an error naming the missing key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if card payments are not
    /// configured.
    pub fn require_stripe(&self) -> Result<&StripeConfig, ConfigError> {
        self.stripe
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("STRIPE_PUBLISHABLE_KEY".to_string()))
    }
}

impl StripeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(key) = get_optional_env("STRIPE_PUBLISHABLE_KEY") else {
            return Ok(None);
        };

        Ok(Some(Self {
            publishable_key: validate_publishable_key(&key, "STRIPE_PUBLISHABLE_KEY")?,
            api_base: get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
        }))
    }
}

/// Durable storage directory from `GLASSHOUSE_STORAGE_DIR`.
///
/// Available without the rest of the configuration, for commands that only
/// touch the local cart.
#[must_use]
pub fn storage_dir_from_env() -> PathBuf {
    let _ = dotenvy::dotenv();
    PathBuf::from(get_env_or_default(
        "GLASSHOUSE_STORAGE_DIR",
        DEFAULT_STORAGE_DIR,
    ))
}

fn checkout_settings_from_env() -> Result<CheckoutSettings, ConfigError> {
    let defaults = CheckoutSettings::default();

    let redirect_delay = match get_optional_env("GLASSHOUSE_REDIRECT_DELAY_SECS") {
        Some(value) => Duration::from_secs(value.trim().parse::<u64>().map_err(|e| {
            ConfigError::InvalidEnvVar("GLASSHOUSE_REDIRECT_DELAY_SECS".to_string(), e.to_string())
        })?),
        None => defaults.redirect_delay,
    };

    Ok(CheckoutSettings {
        complete_redirect: get_env_or_default(
            "GLASSHOUSE_COMPLETE_REDIRECT",
            &defaults.complete_redirect,
        ),
        redirect_delay,
        guest_checkout_path: get_env_or_default(
            "GLASSHOUSE_GUEST_CHECKOUT_PATH",
            &defaults.guest_checkout_path,
        ),
        empty_cart_redirect: get_env_or_default(
            "GLASSHOUSE_EMPTY_CART_REDIRECT",
            &defaults.empty_cart_redirect,
        ),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an absolute http(s) base URL.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate a Stripe publishable key: known prefix, not a placeholder,
/// random-looking body.
fn validate_publishable_key(key: &str, var_name: &str) -> Result<SecretString, ConfigError> {
    let key = key.trim();

    if key.starts_with("sk_") || key.starts_with("rk_") {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "is a secret key; only publishable keys belong on the client".to_string(),
        ));
    }

    let Some(body) = PUBLISHABLE_KEY_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
    else {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must start with pk_test_ or pk_live_".to_string(),
        ));
    };

    let lower = body.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(body);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(SecretString::from(key.to_string()))
}
