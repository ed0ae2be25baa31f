//! The checkout state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use glasshouse_core::{
    Address, AddressId, CheckoutStep, Email, PayLaterRequestId, PaymentIntentId,
    PaymentIntentStatus, SavedAddress,
};

use super::card::{CardInput, validate_card};
use super::resolver::{EntryPoint, IntentContext, Resolution, resolve_intent};
use super::{CheckoutContext, Purchase};
use crate::api::{CheckoutApi, IntentLineItem, PayLaterRequest, SaveAddressRequest};
use crate::auth::SessionToken;
use crate::cart::{CartLineItem, CartStore};
use crate::error::{CheckoutError, add_breadcrumb};
use crate::models::buy_now;
use crate::payments::{BillingDetails, ClientSecret, PaymentProvider};
use crate::shipping::{validate_billing_address, validate_shipping_address};
use crate::validation::{Field, FieldErrors};

const SHIPPING_ADDRESS_FIELDS: [Field; 4] = [
    Field::AddressLine1,
    Field::City,
    Field::State,
    Field::ZipCode,
];

const BILLING_ADDRESS_FIELDS: [Field; 4] = [
    Field::BillingAddressLine1,
    Field::BillingCity,
    Field::BillingState,
    Field::BillingZipCode,
];

const CARD_FIELDS: [Field; 4] = [
    Field::CardNumber,
    Field::CardExpiry,
    Field::CardCvc,
    Field::BillingZip,
];

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    InProgress(CheckoutStep),
    /// Payment confirmed.
    Complete,
    /// Pay-later request filed.
    Submitted,
}

/// Result of [`CheckoutSession::begin`].
pub enum EntryDecision<A, P> {
    Start(Box<CheckoutSession<A, P>>),
    /// Nothing to buy; send the customer here instead.
    Redirect(String),
}

/// A navigation to perform once the completion screen has been shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRedirect {
    pub to: String,
    pub after: Duration,
}

impl ScheduledRedirect {
    /// Wait out the delay and return the target.
    pub async fn wait(self) -> String {
        tokio::time::sleep(self.after).await;
        self.to
    }
}

/// A side effect that failed without affecting the main outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The shipping address could not be saved to the account.
    AddressNotSaved { reason: String },
}

/// A confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub checkout_id: Uuid,
    pub intent_id: PaymentIntentId,
    pub amount_cents: u64,
    pub redirect: ScheduledRedirect,
    pub advisories: Vec<Advisory>,
}

/// Result of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Payment confirmed; the session is `Complete`.
    Completed(Completion),
    /// Pay-later request filed; the session is `Submitted`.
    Submitted { request_id: Option<PayLaterRequestId> },
    /// Some fields are invalid; see [`CheckoutSession::errors`].
    InvalidFields,
    /// A guest started from the cart and must continue on this page.
    RedirectToGuestCheckout(String),
    /// A network or provider failure. The message is also kept as
    /// [`CheckoutSession::error`]; resubmitting is allowed.
    Failed { message: String },
}

/// Shared view of whether a submit is in flight.
///
/// Cloned out of the session with [`CheckoutSession::processing_flag`] so a
/// front end can disable its submit controls while the session itself is
/// borrowed by the pending submit.
#[derive(Debug, Clone, Default)]
pub struct ProcessingFlag(Arc<AtomicBool>);

impl ProcessingFlag {
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<ProcessingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingGuard(self.clone()))
    }
}

/// Resets the processing flag when a submit finishes or is abandoned.
struct ProcessingGuard(ProcessingFlag);

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.0.store(false, Ordering::Release);
    }
}

/// One customer's pass through checkout. Never persisted.
pub struct CheckoutSession<A, P> {
    id: Uuid,
    ctx: Arc<CheckoutContext<A, P>>,
    entry: EntryPoint,
    purchase: Purchase,
    state: CheckoutState,
    contact_email: String,
    shipping: Address,
    saved_addresses: Vec<SavedAddress>,
    selected_address: Option<AddressId>,
    billing_same_as_shipping: bool,
    billing: Address,
    card: CardInput,
    save_address: bool,
    client_secret: Option<ClientSecret>,
    errors: FieldErrors,
    error: Option<String>,
    processing: ProcessingFlag,
}

impl<A: CheckoutApi, P: PaymentProvider> CheckoutSession<A, P> {
    /// Decide whether checkout can start.
    ///
    /// The buy-now entry point uses the descriptor in session storage,
    /// picking up a pre-created intent from `query` when the descriptor has
    /// none. Other entry points use the cart. With nothing to buy the
    /// customer is redirected and no session is created.
    ///
    /// # Errors
    ///
    /// Returns an error if session storage cannot be read.
    pub fn begin(
        ctx: Arc<CheckoutContext<A, P>>,
        entry: EntryPoint,
        cart: CartStore,
        query: &str,
    ) -> Result<EntryDecision<A, P>, CheckoutError> {
        let buy_now = if entry == EntryPoint::BuyNow {
            buy_now::load(ctx.session_storage.as_ref())?
        } else {
            None
        };

        let (entry, purchase) = match buy_now {
            Some(product) => (
                EntryPoint::BuyNow,
                Purchase::BuyNow(product.with_intent_from_query(query)),
            ),
            None if cart.is_empty() => {
                tracing::info!(?entry, "Nothing to check out, redirecting");
                return Ok(EntryDecision::Redirect(
                    ctx.settings.empty_cart_redirect.clone(),
                ));
            }
            None if entry == EntryPoint::BuyNow => (EntryPoint::Cart, Purchase::Cart(cart)),
            None => (entry, Purchase::Cart(cart)),
        };

        let session = Self {
            id: Uuid::new_v4(),
            ctx,
            entry,
            purchase,
            state: CheckoutState::InProgress(CheckoutStep::Contact),
            contact_email: String::new(),
            shipping: Address::default(),
            saved_addresses: Vec::new(),
            selected_address: None,
            billing_same_as_shipping: true,
            billing: Address::default(),
            card: CardInput::default(),
            save_address: false,
            client_secret: None,
            errors: FieldErrors::new(),
            error: None,
            processing: ProcessingFlag::default(),
        };

        tracing::info!(checkout_id = %session.id, entry = ?session.entry, "Checkout started");
        add_breadcrumb("checkout", "Checkout started", None);

        Ok(EntryDecision::Start(Box::new(session)))
    }
}

impl<A, P> CheckoutSession<A, P> {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn entry(&self) -> EntryPoint {
        self.entry
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// Current step, or `None` once the session has finished.
    #[must_use]
    pub const fn current_step(&self) -> Option<CheckoutStep> {
        match self.state {
            CheckoutState::InProgress(step) => Some(step),
            CheckoutState::Complete | CheckoutState::Submitted => None,
        }
    }

    #[must_use]
    pub const fn purchase(&self) -> &Purchase {
        &self.purchase
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.purchase.items()
    }

    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Session-level error from the last failed submit.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a submit is in flight. Submit controls should be disabled
    /// while this is set.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.is_set()
    }

    /// A handle that keeps reporting [`is_processing`](Self::is_processing)
    /// while a submit holds the session.
    #[must_use]
    pub fn processing_flag(&self) -> ProcessingFlag {
        self.processing.clone()
    }

    /// Whether a client secret has been obtained for this session.
    #[must_use]
    pub const fn has_client_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    #[must_use]
    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    #[must_use]
    pub fn saved_addresses(&self) -> &[SavedAddress] {
        &self.saved_addresses
    }

    #[must_use]
    pub const fn selected_address(&self) -> Option<&AddressId> {
        self.selected_address.as_ref()
    }

    /// The address the order ships to: the selected saved address, or the
    /// new-address form.
    #[must_use]
    pub fn shipping_address(&self) -> &Address {
        self.selected_address
            .as_ref()
            .and_then(|id| self.saved_addresses.iter().find(|saved| &saved.id == id))
            .map_or(&self.shipping, |saved| &saved.address)
    }

    #[must_use]
    pub fn billing_address(&self) -> &Address {
        if self.billing_same_as_shipping {
            self.shipping_address()
        } else {
            &self.billing
        }
    }

    #[must_use]
    pub const fn billing_same_as_shipping(&self) -> bool {
        self.billing_same_as_shipping
    }

    pub fn set_contact_email(&mut self, email: impl Into<String>) {
        let email = email.into();
        if email != self.contact_email {
            self.errors.remove(Field::Email);
        }
        self.contact_email = email;
    }

    /// Fill the new-address form and ship to it.
    pub fn set_shipping_address(&mut self, address: Address) {
        if self.selected_address.take().is_some() {
            self.clear_shipping_errors();
        } else {
            let changed = changed_address_fields(&self.shipping, &address, SHIPPING_ADDRESS_FIELDS);
            if !changed.is_empty() {
                self.errors.remove_all(&changed);
                self.errors.remove(Field::ShippingArea);
            }
        }
        self.shipping = address;
    }

    pub fn set_billing_same_as_shipping(&mut self, same: bool) {
        if same != self.billing_same_as_shipping {
            self.errors.remove_all(&BILLING_ADDRESS_FIELDS);
        }
        self.billing_same_as_shipping = same;
    }

    pub fn set_billing_address(&mut self, address: Address) {
        let changed = changed_address_fields(&self.billing, &address, BILLING_ADDRESS_FIELDS);
        self.errors.remove_all(&changed);
        self.billing = address;
    }

    pub fn set_card(&mut self, card: CardInput) {
        let pairs = [
            (self.card.number != card.number, Field::CardNumber),
            (self.card.expiry != card.expiry, Field::CardExpiry),
            (self.card.cvc != card.cvc, Field::CardCvc),
            (self.card.billing_zip != card.billing_zip, Field::BillingZip),
        ];
        for (changed, field) in pairs {
            if changed {
                self.errors.remove(field);
            }
        }
        self.card = card;
    }

    /// Opt in to saving a new shipping address as the account's primary
    /// address after payment.
    pub const fn set_save_address(&mut self, save: bool) {
        self.save_address = save;
    }

    /// Ship to one of the loaded saved addresses.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownAddress`] if no loaded address has
    /// this id.
    pub fn select_saved_address(&mut self, id: &AddressId) -> Result<(), CheckoutError> {
        if !self.saved_addresses.iter().any(|saved| &saved.id == id) {
            return Err(CheckoutError::UnknownAddress(id.clone()));
        }
        self.selected_address = Some(id.clone());
        self.clear_shipping_errors();
        Ok(())
    }

    /// Switch back to the new-address form.
    pub fn use_new_address(&mut self) {
        if self.selected_address.take().is_some() {
            self.clear_shipping_errors();
        }
    }

    /// Validate the current step and move to the next one.
    ///
    /// Returns the step the session is on afterwards. On a validation
    /// failure that is the same step, with [`errors`](Self::errors)
    /// populated.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] from the payment step
    /// (which is left by submitting) or once the session has finished.
    pub fn continue_step(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let step = self.active_step()?;

        let (next, errors) = match step {
            CheckoutStep::Contact => {
                self.errors.remove(Field::Email);
                (CheckoutStep::Shipping, self.validate_contact())
            }
            CheckoutStep::Shipping => {
                self.clear_shipping_errors();
                (CheckoutStep::Payment, self.validate_shipping())
            }
            CheckoutStep::Payment => {
                return Err(CheckoutError::InvalidTransition(
                    "the payment step is completed by submitting".to_string(),
                ));
            }
        };

        if !errors.is_empty() {
            tracing::debug!(
                checkout_id = %self.id,
                step = %step,
                errors = errors.len(),
                "Step validation failed"
            );
            self.errors.extend(errors);
            return Ok(step);
        }

        tracing::debug!(checkout_id = %self.id, from = %step, to = %next, "Checkout step advanced");
        let step_name = next.to_string();
        add_breadcrumb("checkout", "Step advanced", Some(&[("step", step_name.as_str())]));
        self.state = CheckoutState::InProgress(next);
        Ok(next)
    }

    /// Return to an earlier (or the current) step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] when `step` is ahead of
    /// the current step or the session has finished.
    pub fn go_back(&mut self, step: CheckoutStep) -> Result<(), CheckoutError> {
        let current = self.active_step()?;
        if step > current {
            return Err(CheckoutError::InvalidTransition(format!(
                "cannot skip ahead from {current} to {step}"
            )));
        }
        self.state = CheckoutState::InProgress(step);
        self.error = None;
        Ok(())
    }

    fn active_step(&self) -> Result<CheckoutStep, CheckoutError> {
        self.current_step().ok_or_else(|| {
            CheckoutError::InvalidTransition("checkout has already finished".to_string())
        })
    }

    fn require_payment_step(&self) -> Result<(), CheckoutError> {
        match self.active_step()? {
            CheckoutStep::Payment => Ok(()),
            step => Err(CheckoutError::InvalidTransition(format!(
                "cannot submit from the {step} step"
            ))),
        }
    }

    fn clear_shipping_errors(&mut self) {
        self.errors.remove_all(&SHIPPING_ADDRESS_FIELDS);
        self.errors.remove(Field::ShippingArea);
    }

    fn validate_contact(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.contact_email.trim().is_empty() {
            errors.insert(Field::Email, "Email is required");
        } else if Email::parse(&self.contact_email).is_err() {
            errors.insert(Field::Email, "Enter a valid email address");
        }
        errors
    }

    fn validate_shipping(&self) -> FieldErrors {
        validate_shipping_address(self.shipping_address(), &self.purchase.items()).errors
    }

    /// Re-check contact and shipping before a submit. On failure the session
    /// moves back to the first invalid step.
    fn revalidate_earlier_steps(&mut self) -> bool {
        self.errors.remove(Field::Email);
        let contact = self.validate_contact();
        if !contact.is_empty() {
            self.errors.extend(contact);
            self.state = CheckoutState::InProgress(CheckoutStep::Contact);
            return false;
        }

        self.clear_shipping_errors();
        let shipping = self.validate_shipping();
        if !shipping.is_empty() {
            self.errors.extend(shipping);
            self.state = CheckoutState::InProgress(CheckoutStep::Shipping);
            return false;
        }

        true
    }

    fn fail(&mut self, message: String) -> SubmitOutcome {
        self.error = Some(message.clone());
        SubmitOutcome::Failed { message }
    }

    /// The purchase has been paid for: empty the cart, or drop the buy-now
    /// descriptor and leave the cart alone.
    fn finish_purchase(&self) {
        match &self.purchase {
            Purchase::Cart(cart) => cart.clear(),
            Purchase::BuyNow(_) => {
                if let Err(e) = buy_now::clear(self.ctx.session_storage.as_ref()) {
                    tracing::warn!(error = %e, "Failed to clear buy-now descriptor");
                }
            }
        }
    }
}

impl<A: CheckoutApi, P: PaymentProvider> CheckoutSession<A, P> {
    /// Fetch the signed-in user's saved addresses and preselect the primary
    /// one. Guests and failed loads keep the new-address form.
    #[instrument(skip(self), fields(checkout_id = %self.id))]
    pub async fn load_saved_addresses(&mut self) -> &[SavedAddress] {
        let Some(token) = self.ctx.auth.token() else {
            return &self.saved_addresses;
        };

        match self.ctx.api.list_addresses(&token).await {
            Ok(addresses) => {
                tracing::debug!(count = addresses.len(), "Loaded saved addresses");
                self.selected_address = addresses
                    .iter()
                    .find(|saved| saved.is_primary)
                    .map(|saved| saved.id.clone());
                self.saved_addresses = addresses;
                self.clear_shipping_errors();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load saved addresses");
            }
        }

        &self.saved_addresses
    }

    /// Validate the payment step, obtain a client secret and confirm the
    /// card with the payment provider.
    ///
    /// The cart is cleared only after the provider reports success. Network
    /// and provider failures come back as [`SubmitOutcome::Failed`] with the
    /// session left on the payment step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] when not on the payment
    /// step and [`CheckoutError::AlreadyProcessing`] while another submit is
    /// in flight.
    #[instrument(skip(self), fields(checkout_id = %self.id, entry = ?self.entry))]
    pub async fn submit_payment(&mut self) -> Result<SubmitOutcome, CheckoutError> {
        self.require_payment_step()?;
        let _guard = self
            .processing
            .acquire()
            .ok_or(CheckoutError::AlreadyProcessing)?;
        self.error = None;
        add_breadcrumb("checkout", "Payment submitted", None);

        let items = self.purchase.items();
        if items.is_empty() {
            return Ok(self.fail("Your cart is empty.".to_string()));
        }

        if !self.revalidate_earlier_steps() {
            return Ok(SubmitOutcome::InvalidFields);
        }

        self.errors.remove_all(&CARD_FIELDS);
        self.errors.remove_all(&BILLING_ADDRESS_FIELDS);
        let mut payment_errors = FieldErrors::new();
        let card = match validate_card(&self.card, chrono::Local::now().date_naive()) {
            Ok(card) => Some(card),
            Err(errors) => {
                payment_errors.extend(errors);
                None
            }
        };
        if !self.billing_same_as_shipping {
            payment_errors.extend(validate_billing_address(&self.billing).errors);
        }
        let Some(card) = card.filter(|_| payment_errors.is_empty()) else {
            tracing::debug!(errors = payment_errors.len(), "Payment fields invalid");
            self.errors.extend(payment_errors);
            return Ok(SubmitOutcome::InvalidFields);
        };

        let ctx = Arc::clone(&self.ctx);
        let token = ctx.auth.token();
        let shipping = self.shipping_address().normalized();
        let presupplied = match &self.purchase {
            Purchase::BuyNow(product) => product.payment_intent.clone(),
            Purchase::Cart(_) => None,
        };

        let resolution = resolve_intent(
            &ctx.api,
            IntentContext {
                entry: self.entry,
                token: token.as_ref(),
                items: &items,
                email: &self.contact_email,
                shipping_address: &shipping,
                presupplied: presupplied.as_ref(),
            },
        )
        .await;

        let intent = match resolution {
            Ok(Resolution::Intent(intent)) => intent,
            Ok(Resolution::RedirectToGuestCheckout) => {
                return Ok(SubmitOutcome::RedirectToGuestCheckout(
                    ctx.settings.guest_checkout_path.clone(),
                ));
            }
            Err(e) => {
                let err = CheckoutError::from(e);
                err.report();
                return Ok(self.fail(err.user_message()));
            }
        };
        self.client_secret = Some(intent.client_secret.clone());

        // The issuer checks the ZIP entered with the card, not the address ZIP.
        let mut billing_address = self.billing_address().normalized();
        billing_address.zip_code = self.card.billing_zip.trim().to_string();
        let billing = BillingDetails {
            name: None,
            email: Some(self.contact_email.trim().to_string()),
            address: billing_address,
        };

        let confirmation = match ctx
            .payments
            .confirm_card_payment(&intent.client_secret, &card, &billing)
            .await
        {
            Ok(confirmation) if confirmation.status.is_successful() => confirmation,
            Ok(confirmation) => {
                tracing::warn!(
                    intent_id = %confirmation.intent_id,
                    status = ?confirmation.status,
                    "Payment not completed"
                );
                return Ok(self.fail(incomplete_payment_message(confirmation.status).to_string()));
            }
            Err(e) => {
                let err = CheckoutError::from(e);
                err.report();
                return Ok(self.fail(err.user_message()));
            }
        };

        let amount_cents = items
            .iter()
            .map(CartLineItem::line_total_cents)
            .fold(0, u64::saturating_add);
        self.finish_purchase();
        self.state = CheckoutState::Complete;

        tracing::info!(
            intent_id = %confirmation.intent_id,
            amount_cents,
            source = ?intent.source,
            "Checkout complete"
        );
        add_breadcrumb(
            "checkout",
            "Payment confirmed",
            Some(&[("intent_id", confirmation.intent_id.as_str())]),
        );

        let advisories = self
            .save_address_if_requested(token.as_ref(), &shipping)
            .await
            .into_iter()
            .collect();

        Ok(SubmitOutcome::Completed(Completion {
            checkout_id: self.id,
            intent_id: confirmation.intent_id,
            amount_cents,
            redirect: ScheduledRedirect {
                to: ctx.settings.complete_redirect.clone(),
                after: ctx.settings.redirect_delay,
            },
            advisories,
        }))
    }

    /// Best-effort save of a new shipping address as the primary address.
    async fn save_address_if_requested(
        &self,
        token: Option<&SessionToken>,
        shipping: &Address,
    ) -> Option<Advisory> {
        if !self.save_address || self.selected_address.is_some() {
            return None;
        }
        let Some(token) = token else {
            tracing::debug!("Not saving address for a guest checkout");
            return None;
        };

        let request = SaveAddressRequest {
            address: shipping.clone(),
            is_primary: true,
        };
        match self.ctx.api.save_address(token, &request).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save shipping address");
                Some(Advisory::AddressNotSaved {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// File a pay-later request instead of paying by card.
    ///
    /// The payment provider is not involved and the cart is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] when not on the payment
    /// step and [`CheckoutError::AlreadyProcessing`] while another submit is
    /// in flight.
    #[instrument(skip(self, message), fields(checkout_id = %self.id))]
    pub async fn submit_pay_later(
        &mut self,
        message: Option<String>,
    ) -> Result<SubmitOutcome, CheckoutError> {
        self.require_payment_step()?;
        let _guard = self
            .processing
            .acquire()
            .ok_or(CheckoutError::AlreadyProcessing)?;
        self.error = None;

        let items = self.purchase.items();
        if items.is_empty() {
            return Ok(self.fail("Your cart is empty.".to_string()));
        }
        if !self.revalidate_earlier_steps() {
            return Ok(SubmitOutcome::InvalidFields);
        }

        let ctx = Arc::clone(&self.ctx);
        let token = ctx.auth.token();
        let request = PayLaterRequest {
            email: self.contact_email.trim().to_string(),
            shipping_address: self.shipping_address().normalized(),
            items: items.iter().map(IntentLineItem::from).collect(),
            message: message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        };

        match ctx.api.submit_pay_later(token.as_ref(), &request).await {
            Ok(response) => {
                self.state = CheckoutState::Submitted;
                tracing::info!(request_id = ?response.request_id, "Pay-later request submitted");
                add_breadcrumb("checkout", "Pay-later request submitted", None);
                Ok(SubmitOutcome::Submitted {
                    request_id: response.request_id,
                })
            }
            Err(e) => {
                let err = CheckoutError::from(e);
                err.report();
                Ok(self.fail(err.user_message()))
            }
        }
    }
}

/// Message for a confirmation that came back without a successful status.
const fn incomplete_payment_message(status: PaymentIntentStatus) -> &'static str {
    match status {
        PaymentIntentStatus::RequiresAction => {
            "Your bank needs additional verification for this payment. Please try a different card."
        }
        PaymentIntentStatus::RequiresPaymentMethod => {
            "Your payment was not completed. Please try a different card."
        }
        PaymentIntentStatus::Canceled => {
            "This payment was canceled. Please start checkout again."
        }
        PaymentIntentStatus::RequiresConfirmation
        | PaymentIntentStatus::Processing
        | PaymentIntentStatus::RequiresCapture
        | PaymentIntentStatus::Succeeded => "Payment could not be confirmed. Please try again.",
    }
}

/// Fields whose values differ between two addresses.
fn changed_address_fields(old: &Address, new: &Address, fields: [Field; 4]) -> Vec<Field> {
    let [line1, city, state, zip] = fields;
    [
        (old.address_line1 != new.address_line1, line1),
        (old.city != new.city, city),
        (old.state != new.state, state),
        (old.zip_code != new.zip_code, zip),
    ]
    .into_iter()
    .filter_map(|(changed, field)| changed.then_some(field))
    .collect()
}
