//! Glasshouse CLI - drive the cart and checkout flow from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product described in a JSON file
//! glasshouse cart add --product product.json --quantity 2
//!
//! # Add a made-to-order door at a custom size
//! glasshouse cart add --product door.json --variant Oak --height 80 --width 36
//!
//! # Show the cart
//! glasshouse cart list
//!
//! # Check whether an address is inside the restricted-item delivery area
//! glasshouse eligibility --city Brooklyn --state NY --zip 11201
//!
//! # Pay for the cart as a guest
//! glasshouse checkout --guest -e jane@example.com --address "12 Main St" \
//!     --city Hoboken --state NJ --zip 07030 \
//!     --card-number 4242424242424242 --expiry 12/30 --cvc 123
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and edit the persisted cart
//! - `eligibility` - Check a destination against the delivery area
//! - `checkout` - Run a checkout against the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glasshouse_storefront::config::SentryConfig;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "glasshouse")]
#[command(author, version, about = "Glasshouse cart and checkout tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check whether a destination can receive restricted items
    Eligibility {
        #[arg(long)]
        city: String,

        /// Two-letter state code
        #[arg(long)]
        state: String,

        #[arg(long)]
        zip: String,
    },
    /// Check out the cart, or a buy-now product
    Checkout(commands::checkout::CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// JSON file describing the product
        #[arg(short, long)]
        product: PathBuf,

        /// Variant name
        #[arg(short, long)]
        variant: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[command(flatten)]
        size: SizeArgs,
    },
    /// List the cart contents
    List,
    /// Set the quantity of a line (zero or less removes it)
    Update {
        #[command(flatten)]
        line: LineArgs,

        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Empty the cart
    Clear,
}

/// Identity of a cart line.
#[derive(clap::Args)]
struct LineArgs {
    /// Product ID
    #[arg(long = "product-id")]
    product_id: String,

    /// Variant name
    #[arg(short, long)]
    variant: Option<String>,

    #[command(flatten)]
    size: SizeArgs,
}

/// Custom size in inches, for made-to-order products.
#[derive(clap::Args)]
struct SizeArgs {
    #[arg(long, requires = "width")]
    height: Option<Decimal>,

    #[arg(long, requires = "height")]
    width: Option<Decimal>,
}

#[tokio::main]
async fn main() {
    let sentry = SentryConfig::from_env();
    let _sentry_guard = init_sentry(&sentry);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glasshouse_storefront=info,glasshouse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                product,
                variant,
                quantity,
                size,
            } => commands::cart::add(&product, variant.as_deref(), quantity, size.dimensions())?,
            CartAction::List => commands::cart::list()?,
            CartAction::Update { line, quantity } => {
                commands::cart::update(&line.key(), quantity)?;
            }
            CartAction::Remove { line } => commands::cart::remove(&line.key())?,
            CartAction::Clear => commands::cart::clear()?,
        },
        Commands::Eligibility { city, state, zip } => {
            commands::eligibility::check(&city, &state, &zip)?;
        }
        Commands::Checkout(args) => commands::checkout::run(args).await?,
    }
    Ok(())
}

impl SizeArgs {
    fn dimensions(&self) -> Option<glasshouse_core::Dimensions> {
        match (self.height, self.width) {
            (Some(height), Some(width)) => Some(glasshouse_core::Dimensions::new(height, width)),
            _ => None,
        }
    }
}

impl LineArgs {
    fn key(&self) -> glasshouse_storefront::cart::LineKey {
        glasshouse_storefront::cart::LineKey {
            product_id: self.product_id.as_str().into(),
            variant_name: self.variant.clone(),
            dimensions: self.size.dimensions(),
        }
    }
}

/// Initialize Sentry error tracking.
///
/// Returns a guard that must be kept alive for the duration of the program.
/// If `SENTRY_DSN` is not configured, returns `None` and Sentry is disabled.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.environment.clone().map(Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels onto Sentry: errors and warnings become events, info
/// and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}
