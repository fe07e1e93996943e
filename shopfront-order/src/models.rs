use serde::{Deserialize, Serialize};
use shopfront_core::{
    Address, FieldErrors, OrderConfirmation, PaymentDetails, PaymentReference, ShippingDetails,
};
use std::fmt;

/// Checkout wizard steps, in order
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    pub const ALL: [CheckoutStep; 3] = [CheckoutStep::Shipping, CheckoutStep::Payment, CheckoutStep::Review];

    /// 1-based position shown in the progress bar
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::Shipping => 1,
            CheckoutStep::Payment => 2,
            CheckoutStep::Review => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CheckoutStep::Shipping => "Shipping",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Review => "Review",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CheckoutStep::Shipping => "📦",
            CheckoutStep::Payment => "💳",
            CheckoutStep::Review => "📋",
        }
    }

    /// `None` on the last step
    pub fn next(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Shipping => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => Some(CheckoutStep::Review),
            CheckoutStep::Review => None,
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Input submitted when a step's form is completed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", content = "data", rename_all = "lowercase")]
pub enum StepData {
    Shipping(ShippingDetails),
    Payment(PaymentDetails),
    Review,
}

impl StepData {
    pub fn step(&self) -> CheckoutStep {
        match self {
            StepData::Shipping(_) => CheckoutStep::Shipping,
            StepData::Payment(_) => CheckoutStep::Payment,
            StepData::Review => CheckoutStep::Review,
        }
    }
}

/// Per-step accumulator for the order being composed.
///
/// A section is `Some` only once its step has completed. The payment section only ever
/// holds a [`PaymentReference`], never raw card fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub shipping: Option<ShippingDetails>,
    pub payment: Option<PaymentReference>,
    pub billing: Option<Address>,
}

impl OrderDraft {
    /// Names of the populated sections, in draft order
    pub fn completed_sections(&self) -> Vec<&'static str> {
        let mut sections = Vec::new();
        if self.shipping.is_some() {
            sections.push("shipping");
        }
        if self.payment.is_some() {
            sections.push("payment");
        }
        if self.billing.is_some() {
            sections.push("billing");
        }
        sections
    }

    pub fn missing_sections(&self) -> Vec<&'static str> {
        let completed = self.completed_sections();
        ["shipping", "payment", "billing"]
            .into_iter()
            .filter(|section| !completed.contains(section))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_sections().is_empty()
    }
}

/// The whole wizard session as one serializable record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub draft: OrderDraft,
    /// Set while a submission is awaiting the gateway
    pub processing: bool,
    pub field_errors: FieldErrors,
    pub last_failure: Option<String>,
    pub confirmation: Option<OrderConfirmation>,
}

/// One entry of the checkout progress bar
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub step: CheckoutStep,
    pub number: u8,
    pub title: &'static str,
    pub icon: &'static str,
    pub active: bool,
    pub completed: bool,
}

impl StepProgress {
    pub fn for_current(current: CheckoutStep) -> Vec<StepProgress> {
        CheckoutStep::ALL
            .iter()
            .map(|step| StepProgress {
                step: *step,
                number: step.number(),
                title: step.title(),
                icon: step.icon(),
                active: current >= *step,
                completed: current > *step,
            })
            .collect()
    }
}
