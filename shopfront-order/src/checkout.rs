use crate::models::{CheckoutState, CheckoutStep, OrderDraft, StepData, StepProgress};
use crate::validation::PaymentValidator;
use chrono::Utc;
use shopfront_catalog::{Cart, PriceBreakdown, PricingCalculator};
use shopfront_core::{
    CardVault, CoreError, FieldErrors, FinalizedOrder, OrderConfirmation, OrderSubmissionGateway,
    PaymentDetails, PaymentMethod, PaymentReference, ShippingDetails, SubmissionError,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives the Shipping → Payment → Review sequence for one cart and places the order.
///
/// All session data lives in a single [`CheckoutState`], which can be exported with
/// [`CheckoutWizard::state`] and fed back through [`CheckoutWizard::restore`].
pub struct CheckoutWizard {
    cart: Cart,
    state: CheckoutState,
    validator: PaymentValidator,
    vault: Arc<dyn CardVault>,
    submission_timeout: Duration,
}

impl CheckoutWizard {
    pub fn new(cart: Cart, vault: Arc<dyn CardVault>) -> Self {
        Self::restore(cart, CheckoutState::default(), vault)
    }

    /// Resume a session from an exported state.
    pub fn restore(cart: Cart, mut state: CheckoutState, vault: Arc<dyn CardVault>) -> Self {
        // No gateway call survives a restore.
        state.processing = false;
        Self {
            cart,
            state,
            validator: PaymentValidator::new(),
            vault,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }

    pub fn with_validator(mut self, validator: PaymentValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn current_step(&self) -> CheckoutStep {
        self.state.step
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.state.draft
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.state.field_errors
    }

    /// Called when the user edits a field that previously failed validation.
    pub fn clear_field_error(&mut self, field: &str) {
        self.state.field_errors.clear(field);
    }

    pub fn is_processing(&self) -> bool {
        self.state.processing
    }

    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.state.confirmation.as_ref()
    }

    /// Running totals for the sidebar and the review step
    pub fn summary(&self) -> PriceBreakdown {
        PricingCalculator::quote(self.cart.items())
    }

    pub fn progress(&self) -> Vec<StepProgress> {
        StepProgress::for_current(self.state.step)
    }

    /// Complete the current step with its form data and move to the next one.
    ///
    /// On the review step this is a no-op. Data for a different step is rejected without
    /// touching the draft.
    pub fn advance(&mut self, data: StepData) -> Result<CheckoutStep, CheckoutError> {
        let current = self.state.step;
        if current == CheckoutStep::Review {
            tracing::debug!("Advance requested on review step; staying put");
            return Ok(current);
        }
        if data.step() != current {
            return Err(CheckoutError::StepMismatch {
                expected: current,
                got: data.step(),
            });
        }

        match data {
            StepData::Shipping(details) => self.complete_shipping(details)?,
            StepData::Payment(details) => self.complete_payment(details)?,
            StepData::Review => {}
        }

        self.state.field_errors = FieldErrors::new();
        self.state.step = current.next().unwrap_or(current);
        tracing::info!("Checkout step {} completed, now on {}", current, self.state.step);
        Ok(self.state.step)
    }

    fn complete_shipping(&mut self, details: ShippingDetails) -> Result<(), CheckoutError> {
        let errors = details.validate();
        if !errors.is_empty() {
            return Err(self.reject(CheckoutStep::Shipping, errors));
        }
        self.state.draft.shipping = Some(details);
        Ok(())
    }

    fn complete_payment(&mut self, details: PaymentDetails) -> Result<(), CheckoutError> {
        let errors = self.validator.validate(&details);
        if !errors.is_empty() {
            return Err(self.reject(CheckoutStep::Payment, errors));
        }

        let billing = details
            .supplied_billing_address()
            .cloned()
            .or_else(|| self.state.draft.shipping.as_ref().map(|s| s.address.clone()));

        let PaymentDetails { method, card, .. } = details;
        let reference = match method {
            PaymentMethod::Card => {
                let summary = PaymentReference::card(&card);
                // The raw card moves into the vault and is dropped here.
                let token = self.vault.tokenize(card)?;
                summary.with_token(token)
            }
            wallet => PaymentReference::redirect(wallet),
        };

        tracing::info!("Payment step accepted for {}", reference.display_label());
        self.state.draft.payment = Some(reference);
        self.state.draft.billing = billing;
        Ok(())
    }

    fn reject(&mut self, step: CheckoutStep, errors: FieldErrors) -> CheckoutError {
        let fields: Vec<&str> = errors.fields().collect();
        tracing::warn!("{} step failed validation on fields {:?}", step, fields);
        self.state.field_errors = errors.clone();
        CheckoutError::Validation(errors)
    }

    /// Assemble the order and mark a submission as in flight.
    ///
    /// Pair with [`CheckoutWizard::complete_submission`]; [`CheckoutWizard::place_order`]
    /// does both around a gateway call.
    pub fn begin_submission(&mut self) -> Result<FinalizedOrder, CheckoutError> {
        if self.state.processing {
            return Err(CheckoutError::SubmissionInFlight);
        }
        if self.state.confirmation.is_some() {
            return Err(CheckoutError::AlreadyPlaced);
        }
        if self.state.step != CheckoutStep::Review {
            return Err(CheckoutError::NotOnReview(self.state.step));
        }

        let order = self.finalize()?;
        self.state.processing = true;
        self.state.last_failure = None;
        Ok(order)
    }

    /// Record the gateway's answer. Failures keep the draft and the review step for a manual retry.
    pub fn complete_submission(
        &mut self,
        outcome: Result<OrderConfirmation, SubmissionError>,
    ) -> Result<OrderConfirmation, CheckoutError> {
        self.state.processing = false;
        match outcome {
            Ok(confirmation) => {
                tracing::info!(
                    "Order {} placed ({}), total {}",
                    confirmation.order_number,
                    confirmation.order_id,
                    confirmation.total
                );
                self.state.confirmation = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(e) => {
                tracing::error!("Order submission failed: {}", e);
                self.state.last_failure = Some(e.to_string());
                Err(CheckoutError::Submission(e))
            }
        }
    }

    /// Submit the finalized order through the gateway exactly once. No retries.
    pub async fn place_order<G>(&mut self, gateway: &G) -> Result<OrderConfirmation, CheckoutError>
    where
        G: OrderSubmissionGateway + ?Sized,
    {
        let order = self.begin_submission()?;
        tracing::info!(
            "Submitting order with {} item(s), total {}",
            order.items().len(),
            order.total()
        );

        let timeout = self.submission_timeout;
        // Clears `processing` if this future is dropped before the gateway answers.
        let in_flight = InFlight { wizard: self };
        let outcome = match tokio::time::timeout(timeout, gateway.submit(order)).await {
            Ok(result) => result,
            Err(_) => Err(SubmissionError::TimedOut(timeout)),
        };
        in_flight.wizard.complete_submission(outcome)
    }

    fn finalize(&self) -> Result<FinalizedOrder, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let draft = &self.state.draft;
        match (&draft.shipping, &draft.payment, &draft.billing) {
            (Some(shipping), Some(payment), Some(billing)) => Ok(FinalizedOrder::new(
                &self.cart,
                shipping.clone(),
                payment.clone(),
                billing.clone(),
                Utc::now(),
            )),
            _ => Err(CheckoutError::IncompleteDraft(draft.missing_sections().join(", "))),
        }
    }
}

struct InFlight<'a> {
    wizard: &'a mut CheckoutWizard,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let state = &mut self.wizard.state;
        if state.processing {
            tracing::warn!("Order submission abandoned before the gateway answered");
            state.processing = false;
            state.last_failure = Some("Order submission was interrupted".to_string());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("{got} data submitted while on the {expected} step")]
    StepMismatch {
        expected: CheckoutStep,
        got: CheckoutStep,
    },

    #[error("Please correct the highlighted fields ({0})")]
    Validation(FieldErrors),

    #[error("Orders can only be placed from the review step (currently on {0})")]
    NotOnReview(CheckoutStep),

    #[error("Order draft is missing: {0}")]
    IncompleteDraft(String),

    #[error("Cannot place an order for an empty cart")]
    EmptyCart,

    #[error("An order submission is already in progress")]
    SubmissionInFlight,

    #[error("This order has already been placed")]
    AlreadyPlaced,

    #[error("Order submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Could not secure payment details: {0}")]
    Vault(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopfront_catalog::CartItem;
    use shopfront_core::payment::{CARD_NUMBER, CVV};
    use shopfront_core::{Address, CardDetails, OrderId, ShippingMethod};
    use std::sync::Mutex;

    struct TestVault;

    impl CardVault for TestVault {
        fn tokenize(&self, card: CardDetails) -> Result<String, CoreError> {
            Ok(format!("tok_{}", card.last_four().unwrap_or_default()))
        }
    }

    struct FailingVault;

    impl CardVault for FailingVault {
        fn tokenize(&self, _card: CardDetails) -> Result<String, CoreError> {
            Err(CoreError::VaultError("vault offline".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingGateway {
        submitted: Mutex<Vec<FinalizedOrder>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait::async_trait]
    impl OrderSubmissionGateway for RecordingGateway {
        async fn submit(&self, order: FinalizedOrder) -> Result<OrderConfirmation, SubmissionError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let confirmation = OrderConfirmation {
                order_id: OrderId::new(),
                order_number: "SF-TEST-000001".to_string(),
                total: order.total(),
                placed_at: order.placed_at(),
            };
            self.submitted.lock().unwrap().push(order);
            if self.fail {
                return Err(SubmissionError::Unavailable("maintenance".to_string()));
            }
            Ok(confirmation)
        }
    }

    fn cart() -> Cart {
        Cart::new(vec![CartItem::new("w1", "Diver Watch", Decimal::from(100), 2).unwrap()]).unwrap()
    }

    fn wizard() -> CheckoutWizard {
        CheckoutWizard::new(cart(), Arc::new(TestVault))
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails::new(
            "Jane Doe",
            Address::new("123 Main Street", "New York", "NY", "10001", "US"),
            ShippingMethod::Express,
        )
    }

    fn valid_card() -> PaymentDetails {
        PaymentDetails::card(CardDetails::new("4111 1111 1111 1111", "09/27", "123", "Jane Doe"))
    }

    fn wizard_on_review() -> CheckoutWizard {
        let mut wizard = wizard();
        wizard.advance(StepData::Shipping(shipping())).unwrap();
        wizard.advance(StepData::Payment(valid_card())).unwrap();
        wizard
    }

    #[test]
    fn test_steps_accumulate_draft_sections() {
        let mut wizard = wizard();
        assert_eq!(wizard.current_step(), CheckoutStep::Shipping);
        assert!(wizard.draft().completed_sections().is_empty());

        assert_eq!(wizard.advance(StepData::Shipping(shipping())).unwrap(), CheckoutStep::Payment);
        assert_eq!(wizard.draft().completed_sections(), vec!["shipping"]);

        assert_eq!(wizard.advance(StepData::Payment(valid_card())).unwrap(), CheckoutStep::Review);
        assert_eq!(wizard.draft().completed_sections(), vec!["shipping", "payment", "billing"]);
        assert_eq!(wizard.draft().shipping, Some(shipping()));
        assert_eq!(wizard.draft().billing, Some(shipping().address));

        let payment = wizard.draft().payment.clone().unwrap();
        assert_eq!(payment.token.as_deref(), Some("tok_1111"));
        assert_eq!(payment.last_four.as_deref(), Some("1111"));
    }

    #[test]
    fn test_advance_saturates_on_review() {
        let mut wizard = wizard_on_review();
        let before = wizard.state().clone();

        assert_eq!(wizard.advance(StepData::Review).unwrap(), CheckoutStep::Review);
        assert_eq!(wizard.advance(StepData::Shipping(shipping())).unwrap(), CheckoutStep::Review);

        assert_eq!(wizard.state(), &before);
        assert_eq!(wizard.current_step().number(), 3);
    }

    #[test]
    fn test_mismatched_step_data_is_rejected() {
        let mut wizard = wizard();
        let result = wizard.advance(StepData::Payment(valid_card()));

        assert!(matches!(
            result,
            Err(CheckoutError::StepMismatch { expected: CheckoutStep::Shipping, got: CheckoutStep::Payment })
        ));
        assert!(wizard.draft().payment.is_none());
    }

    #[test]
    fn test_invalid_payment_blocks_progress() {
        let mut wizard = wizard();
        wizard.advance(StepData::Shipping(shipping())).unwrap();

        let bad = PaymentDetails::card(CardDetails::new("123", "13", "1", ""));
        let result = wizard.advance(StepData::Payment(bad));

        match result {
            Err(CheckoutError::Validation(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(wizard.current_step(), CheckoutStep::Payment);
        assert!(wizard.draft().payment.is_none());
        assert!(wizard.draft().billing.is_none());

        wizard.clear_field_error(CARD_NUMBER);
        assert!(!wizard.field_errors().contains(CARD_NUMBER));
        assert!(wizard.field_errors().contains(CVV));

        wizard.advance(StepData::Payment(valid_card())).unwrap();
        assert!(wizard.field_errors().is_empty());
    }

    #[test]
    fn test_invalid_shipping_blocks_progress() {
        let mut wizard = wizard();
        let mut details = shipping();
        details.address.city = "  ".to_string();

        assert!(matches!(wizard.advance(StepData::Shipping(details)), Err(CheckoutError::Validation(_))));
        assert_eq!(wizard.current_step(), CheckoutStep::Shipping);
        assert!(wizard.field_errors().contains("city"));
    }

    #[test]
    fn test_wallet_payment_and_explicit_billing() {
        let mut wizard = wizard();
        wizard.advance(StepData::Shipping(shipping())).unwrap();

        let billing = Address::new("9 Elm Road", "Boston", "MA", "02108", "US");
        let details = PaymentDetails::redirect(PaymentMethod::Paypal).with_billing_address(billing.clone());
        wizard.advance(StepData::Payment(details)).unwrap();

        let payment = wizard.draft().payment.clone().unwrap();
        assert_eq!(payment.method, PaymentMethod::Paypal);
        assert!(payment.token.is_none());
        assert_eq!(wizard.draft().billing, Some(billing));
    }

    #[test]
    fn test_vault_failure_keeps_payment_step() {
        let mut wizard = CheckoutWizard::new(cart(), Arc::new(FailingVault));
        wizard.advance(StepData::Shipping(shipping())).unwrap();

        let result = wizard.advance(StepData::Payment(valid_card()));
        assert!(matches!(result, Err(CheckoutError::Vault(_))));
        assert_eq!(wizard.current_step(), CheckoutStep::Payment);
    }

    #[test]
    fn test_exported_state_holds_no_card_data() {
        let wizard = wizard_on_review();
        let json = serde_json::to_string(wizard.state()).unwrap();

        assert!(!json.contains("4111 1111"));
        assert!(!json.contains("4111111111111111"));
        assert!(!json.contains("\"cvv\""));
    }

    #[test]
    fn test_restore_resumes_session() {
        let wizard = wizard_on_review();
        let mut state = wizard.state().clone();
        state.processing = true;

        let restored = CheckoutWizard::restore(cart(), state, Arc::new(TestVault));
        assert_eq!(restored.current_step(), CheckoutStep::Review);
        assert!(!restored.is_processing());
        assert_eq!(restored.draft(), wizard.draft());
    }

    #[test]
    fn test_summary_matches_finalized_total() {
        let mut wizard = wizard_on_review();
        let summary = wizard.summary();
        let order = wizard.begin_submission().unwrap();

        assert_eq!(summary.total, Decimal::from(241));
        assert_eq!(order.total(), summary.total);
    }

    #[test]
    fn test_repeat_submission_blocked_while_processing() {
        let mut wizard = wizard_on_review();
        wizard.begin_submission().unwrap();

        assert!(wizard.is_processing());
        assert!(matches!(wizard.begin_submission(), Err(CheckoutError::SubmissionInFlight)));
    }

    #[tokio::test]
    async fn test_place_order_submits_once() {
        let gateway = RecordingGateway::default();
        let mut wizard = wizard_on_review();

        let confirmation = wizard.place_order(&gateway).await.unwrap();

        assert_eq!(confirmation.total, Decimal::from(241));
        assert_eq!(gateway.submitted.lock().unwrap().len(), 1);
        assert!(!wizard.is_processing());
        assert!(matches!(wizard.place_order(&gateway).await, Err(CheckoutError::AlreadyPlaced)));
        assert_eq!(gateway.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_draft_for_retry() {
        let failing = RecordingGateway {
            fail: true,
            ..Default::default()
        };
        let mut wizard = wizard_on_review();
        let draft = wizard.draft().clone();

        let result = wizard.place_order(&failing).await;
        assert!(matches!(result, Err(CheckoutError::Submission(SubmissionError::Unavailable(_)))));
        assert_eq!(failing.submitted.lock().unwrap().len(), 1);
        assert_eq!(wizard.current_step(), CheckoutStep::Review);
        assert_eq!(wizard.draft(), &draft);
        assert!(wizard.state().last_failure.is_some());
        assert!(!wizard.is_processing());

        let healthy = RecordingGateway::default();
        wizard.place_order(&healthy).await.unwrap();
        assert!(wizard.state().last_failure.is_none());
        assert!(wizard.confirmation().is_some());
    }

    #[tokio::test]
    async fn test_submission_timeout() {
        let slow = RecordingGateway {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let mut wizard = wizard_on_review().with_submission_timeout(Duration::from_millis(20));

        let result = wizard.place_order(&slow).await;
        assert!(matches!(result, Err(CheckoutError::Submission(SubmissionError::TimedOut(_)))));
        assert!(!wizard.is_processing());
    }

    #[tokio::test]
    async fn test_abandoned_submission_can_be_retried() {
        let slow = RecordingGateway {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let mut wizard = wizard_on_review();

        let abandoned = tokio::time::timeout(Duration::from_millis(20), wizard.place_order(&slow)).await;
        assert!(abandoned.is_err());
        assert!(!wizard.is_processing());
        assert_eq!(wizard.current_step(), CheckoutStep::Review);
        assert!(wizard.state().last_failure.is_some());
        assert!(wizard.confirmation().is_none());

        let healthy = RecordingGateway::default();
        wizard.place_order(&healthy).await.unwrap();
        assert_eq!(healthy.submitted.lock().unwrap().len(), 1);
        assert!(wizard.state().last_failure.is_none());
    }

    #[tokio::test]
    async fn test_place_order_requires_review_step() {
        let gateway = RecordingGateway::default();
        let mut wizard = wizard();

        let result = wizard.place_order(&gateway).await;
        assert!(matches!(result, Err(CheckoutError::NotOnReview(CheckoutStep::Shipping))));
        assert!(gateway.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_be_placed() {
        let gateway = RecordingGateway::default();
        let mut wizard = CheckoutWizard::new(Cart::default(), Arc::new(TestVault));
        wizard.advance(StepData::Shipping(shipping())).unwrap();
        wizard.advance(StepData::Payment(valid_card())).unwrap();

        assert!(matches!(wizard.place_order(&gateway).await, Err(CheckoutError::EmptyCart)));
        assert!(!wizard.is_processing());
    }
}
