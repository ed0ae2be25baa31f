//! Checkout command.
//!
//! Walks a checkout session through contact, shipping and payment using the
//! values given on the command line, then pays by card or files a pay-later
//! request.
//!
//! # Usage
//!
//! ```bash
//! # Signed-in checkout of the cart, shipping to the primary saved address
//! GLASSHOUSE_SESSION_TOKEN=... glasshouse checkout -e jane@example.com \
//!     --use-primary-address --card-number 4242424242424242 --expiry 12/30 --cvc 123
//!
//! # Guest pay-later request
//! glasshouse checkout --guest -e jane@example.com --address "1 Court St" \
//!     --city Brooklyn --state NY --zip 11201 --pay-later --message "Call first"
//!
//! # Buy a single product without touching the cart
//! glasshouse checkout --buy-now product.json -e jane@example.com ...
//! ```
//!
//! # Environment Variables
//!
//! - `GLASSHOUSE_API_BASE_URL` - Backend API base URL (required)
//! - `GLASSHOUSE_SESSION_TOKEN` - Bearer token of a signed-in user
//! - `STRIPE_PUBLISHABLE_KEY` - Required for card payments

use std::path::PathBuf;
use std::sync::Arc;

use glasshouse_core::{Address, AddressId, Price};
use glasshouse_storefront::api::{BackendClient, CheckoutApi};
use glasshouse_storefront::auth::{AuthSession, SessionToken};
use glasshouse_storefront::cart::CartStore;
use glasshouse_storefront::checkout::{
    Advisory, CardInput, CheckoutContext, CheckoutSession, EntryDecision, EntryPoint,
    SubmitOutcome,
};
use glasshouse_storefront::config::{CheckoutConfig, StripeConfig};
use glasshouse_storefront::models::{BuyNowProduct, buy_now};
use glasshouse_storefront::payments::{
    BillingDetails, CardDetails, ClientSecret, PaymentConfirmation, PaymentProvider,
    ProviderError, StripeClient,
};
use glasshouse_storefront::storage::{FileStore, KeyValueStore, MemoryStore};

use super::{CommandError, read_json_file};

const SESSION_TOKEN_VAR: &str = "GLASSHOUSE_SESSION_TOKEN";

#[derive(clap::Args)]
pub struct CheckoutArgs {
    /// Contact email
    #[arg(short, long)]
    email: String,

    /// Check out as a guest even if a session token is set
    #[arg(long)]
    guest: bool,

    /// Buy the product in this JSON file instead of the cart
    #[arg(long, value_name = "FILE")]
    buy_now: Option<PathBuf>,

    /// Query string the product page returned with, carrying a pre-created
    /// payment intent
    #[arg(long, default_value = "")]
    query: String,

    #[command(flatten)]
    shipping: ShippingArgs,

    #[command(flatten)]
    billing: BillingArgs,

    #[command(flatten)]
    card: CardArgs,

    /// Save the shipping address to the account after payment
    #[arg(long)]
    save_address: bool,

    /// Request an invoice instead of paying by card
    #[arg(long, conflicts_with = "card_number")]
    pay_later: bool,

    /// Note attached to a pay-later request
    #[arg(long, requires = "pay_later")]
    message: Option<String>,

    /// Return immediately instead of waiting out the completion redirect
    #[arg(long)]
    no_wait: bool,
}

#[derive(clap::Args)]
struct ShippingArgs {
    /// Ship to this saved address
    #[arg(long, value_name = "ID", conflicts_with = "address")]
    saved_address: Option<String>,

    /// Ship to the account's primary saved address
    #[arg(long, conflicts_with_all = ["address", "saved_address"])]
    use_primary_address: bool,

    /// Street address
    #[arg(long)]
    address: Option<String>,

    /// Apartment, suite, unit
    #[arg(long)]
    address_line2: Option<String>,

    #[arg(long, default_value = "")]
    city: String,

    #[arg(long, default_value = "")]
    state: String,

    #[arg(long, default_value = "")]
    zip: String,
}

#[derive(clap::Args)]
struct BillingArgs {
    /// Billing street address; billing matches shipping when omitted
    #[arg(long)]
    billing_address: Option<String>,

    #[arg(long, requires = "billing_address", default_value = "")]
    billing_city: String,

    #[arg(long, requires = "billing_address", default_value = "")]
    billing_state: String,

    #[arg(long, requires = "billing_address", default_value = "")]
    billing_zip: String,
}

#[derive(clap::Args)]
struct CardArgs {
    #[arg(long)]
    card_number: Option<String>,

    /// `MM/YY` or `MM/YYYY`
    #[arg(long, default_value = "")]
    expiry: String,

    #[arg(long, default_value = "")]
    cvc: String,

    /// Card billing ZIP; defaults to the billing or shipping ZIP
    #[arg(long)]
    card_zip: Option<String>,
}

/// Card payments through Stripe, or no card payments at all when only a
/// pay-later request is being filed.
enum Payments {
    Stripe(StripeClient),
    Disabled,
}

impl Payments {
    fn from_config(stripe: Option<&StripeConfig>) -> Result<Self, ProviderError> {
        Ok(match stripe {
            Some(config) => Self::Stripe(StripeClient::new(config)?),
            None => Self::Disabled,
        })
    }
}

impl PaymentProvider for Payments {
    async fn confirm_card_payment(
        &self,
        secret: &ClientSecret,
        card: &CardDetails,
        billing: &BillingDetails,
    ) -> Result<PaymentConfirmation, ProviderError> {
        match self {
            Self::Stripe(client) => client.confirm_card_payment(secret, card, billing).await,
            Self::Disabled => Err(ProviderError::Api {
                status: 0,
                message: "card payments are not configured".to_string(),
            }),
        }
    }
}

/// Run a checkout.
pub async fn run(args: CheckoutArgs) -> Result<(), CommandError> {
    let config = CheckoutConfig::from_env()?;
    if !args.pay_later {
        config.require_stripe()?;
    }

    let api = BackendClient::new(config.api_base_url.clone())?;
    let payments = Payments::from_config(config.stripe.as_ref())?;

    let auth = match session_token_from_env() {
        Some(token) if !args.guest => AuthSession::signed_in(token),
        _ => AuthSession::new(),
    };

    let cart = CartStore::load(Arc::new(FileStore::open(&config.storage_dir)?));
    let session_storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let entry = if let Some(path) = &args.buy_now {
        let product: BuyNowProduct = read_json_file(path)?;
        buy_now::save(session_storage.as_ref(), &product)?;
        EntryPoint::BuyNow
    } else if args.guest {
        EntryPoint::GuestCheckout
    } else {
        EntryPoint::Cart
    };

    let ctx = Arc::new(CheckoutContext {
        api,
        payments,
        auth,
        session_storage,
        settings: config.checkout.clone(),
    });

    let mut session = match CheckoutSession::begin(ctx, entry, cart, &args.query)? {
        EntryDecision::Start(session) => session,
        EntryDecision::Redirect(to) => {
            return Err(CommandError::Failed(format!(
                "Nothing to check out (would redirect to {to})"
            )));
        }
    };

    print_summary(&session);
    fill_and_advance(&mut session, &args).await?;

    let outcome = if args.pay_later {
        session.submit_pay_later(args.message.clone()).await?
    } else {
        session.submit_payment().await?
    };

    report_outcome(&session, outcome, args.no_wait).await
}

fn session_token_from_env() -> Option<SessionToken> {
    std::env::var(SESSION_TOKEN_VAR)
        .ok()
        .filter(|token| !token.trim().is_empty())
        .map(SessionToken::new)
}

/// Fill in contact and shipping, advancing to the payment step, then fill
/// in the payment fields.
async fn fill_and_advance<A: CheckoutApi, P: PaymentProvider>(
    session: &mut CheckoutSession<A, P>,
    args: &CheckoutArgs,
) -> Result<(), CommandError> {
    session.set_contact_email(args.email.clone());
    advance(session)?;

    let saved = session.load_saved_addresses().await.len();
    tracing::debug!(saved, "Saved addresses available");

    if let Some(id) = &args.shipping.saved_address {
        session.select_saved_address(&AddressId::new(id.as_str()))?;
    } else if args.shipping.use_primary_address {
        if session.selected_address().is_none() {
            return Err(CommandError::Failed(
                "No primary saved address on this account".to_string(),
            ));
        }
    } else {
        session.use_new_address();
        session.set_shipping_address(args.shipping.address());
    }
    advance(session)?;

    if let Some(billing) = args.billing.address() {
        session.set_billing_same_as_shipping(false);
        session.set_billing_address(billing);
    }
    session.set_save_address(args.save_address);

    if !args.pay_later {
        let billing_zip = args
            .card
            .card_zip
            .clone()
            .unwrap_or_else(|| session.billing_address().zip_code.clone());
        session.set_card(CardInput {
            number: args.card.card_number.clone().unwrap_or_default(),
            expiry: args.card.expiry.clone(),
            cvc: args.card.cvc.clone(),
            billing_zip,
        });
    }

    Ok(())
}

/// Continue past the current step, printing field errors when it fails.
fn advance<A, P>(session: &mut CheckoutSession<A, P>) -> Result<(), CommandError> {
    let before = session.current_step();
    let after = session.continue_step()?;
    if Some(after) == before {
        print_field_errors(session);
        return Err(CommandError::InvalidFields {
            step: after.to_string(),
        });
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary<A, P>(session: &CheckoutSession<A, P>) {
    println!("Checking out ({:?}):", session.entry());
    for line in session.items() {
        println!(
            "  {} x {} {}",
            line.quantity,
            line.product_name,
            Price::usd(line.line_total_cents()).display()
        );
    }
    println!(
        "Total: {}",
        Price::usd(session.purchase().total_cents()).display()
    );
}

#[allow(clippy::print_stdout)]
fn print_field_errors<A, P>(session: &CheckoutSession<A, P>) {
    for (field, message) in session.errors().iter() {
        println!("  {field}: {message}");
    }
}

#[allow(clippy::print_stdout)]
async fn report_outcome<A, P>(
    session: &CheckoutSession<A, P>,
    outcome: SubmitOutcome,
    no_wait: bool,
) -> Result<(), CommandError> {
    match outcome {
        SubmitOutcome::Completed(completion) => {
            println!(
                "Payment confirmed: {} for {}",
                completion.intent_id,
                Price::usd(completion.amount_cents).display()
            );
            for advisory in &completion.advisories {
                match advisory {
                    Advisory::AddressNotSaved { reason } => {
                        println!("Note: your address was not saved ({reason})");
                    }
                }
            }
            let to = if no_wait {
                completion.redirect.to
            } else {
                completion.redirect.wait().await
            };
            println!("Continue at {to}");
            Ok(())
        }
        SubmitOutcome::Submitted { request_id } => {
            match request_id {
                Some(id) => println!("Pay-later request submitted ({id})"),
                None => println!("Pay-later request submitted"),
            }
            println!("We'll email an invoice to {}", session.contact_email());
            Ok(())
        }
        SubmitOutcome::InvalidFields => {
            print_field_errors(session);
            Err(CommandError::InvalidFields {
                step: session
                    .current_step()
                    .map_or_else(|| "checkout".to_string(), |step| step.to_string()),
            })
        }
        SubmitOutcome::RedirectToGuestCheckout(path) => Err(CommandError::Failed(format!(
            "Sign in or continue as a guest (rerun with --guest; web path {path})"
        ))),
        SubmitOutcome::Failed { message } => Err(CommandError::Failed(message)),
    }
}

impl ShippingArgs {
    fn address(&self) -> Address {
        Address {
            address_line1: self.address.clone().unwrap_or_default(),
            address_line2: self.address_line2.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip.clone(),
            ..Address::default()
        }
    }
}

impl BillingArgs {
    fn address(&self) -> Option<Address> {
        let line1 = self.billing_address.clone()?;
        Some(Address {
            address_line1: line1,
            city: self.billing_city.clone(),
            state: self.billing_state.clone(),
            zip_code: self.billing_zip.clone(),
            ..Address::default()
        })
    }
}
