use crate::address::Address;
use crate::CoreResult;
use serde::{Deserialize, Serialize};
use shopfront_shared::Masked;

pub const CARD_NUMBER: &str = "cardNumber";
pub const EXPIRY_DATE: &str = "expiryDate";
pub const CVV: &str = "cvv";
pub const NAME_ON_CARD: &str = "nameOnCard";

/// The closed set of ways a shopper can pay
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
    ApplePay,
    GooglePay,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Card,
        PaymentMethod::Paypal,
        PaymentMethod::ApplePay,
        PaymentMethod::GooglePay,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::Paypal => "PayPal",
            PaymentMethod::ApplePay => "Apple Pay",
            PaymentMethod::GooglePay => "Google Pay",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "💳",
            PaymentMethod::Paypal => "🅿️",
            PaymentMethod::ApplePay => "🍎",
            PaymentMethod::GooglePay => "🔵",
        }
    }

    /// Wallet methods complete on the provider's side and carry no card fields.
    pub fn requires_redirect(&self) -> bool {
        !matches!(self, PaymentMethod::Card)
    }
}

/// Raw card fields as typed into the payment step.
///
/// Number and CVV are masked so a stray `{:?}` never prints them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDetails {
    pub card_number: Masked<String>,
    pub expiry_date: String,
    pub cvv: Masked<String>,
    pub name_on_card: String,
}

impl CardDetails {
    pub fn new(
        card_number: impl Into<String>,
        expiry_date: impl Into<String>,
        cvv: impl Into<String>,
        name_on_card: impl Into<String>,
    ) -> Self {
        Self {
            card_number: Masked::new(card_number.into()),
            expiry_date: expiry_date.into(),
            cvv: Masked::new(cvv.into()),
            name_on_card: name_on_card.into(),
        }
    }

    /// Card number with all whitespace removed
    pub fn normalized_number(&self) -> String {
        self.card_number
            .expose()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    pub fn last_four(&self) -> Option<String> {
        let digits: Vec<char> = self
            .normalized_number()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.len() < 4 {
            return None;
        }
        Some(digits[digits.len() - 4..].iter().collect())
    }
}

/// Everything the payment step submits
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    #[serde(flatten)]
    pub card: CardDetails,
    pub billing_address: Option<Address>,
}

impl PaymentDetails {
    pub fn card(card: CardDetails) -> Self {
        Self {
            method: PaymentMethod::Card,
            card,
            billing_address: None,
        }
    }

    /// A wallet payment (PayPal, Apple Pay, Google Pay); card fields stay empty.
    pub fn redirect(method: PaymentMethod) -> Self {
        Self {
            method,
            card: CardDetails::default(),
            billing_address: None,
        }
    }

    pub fn with_billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }

    /// Billing address if one was actually filled in
    pub fn supplied_billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref().filter(|address| !address.is_blank())
    }
}

/// Non-sensitive stand-in for a payment instrument.
///
/// This is what the order draft, the finalized order and every log line see.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReference {
    pub method: PaymentMethod,
    /// Vault token for card payments
    pub token: Option<String>,
    pub last_four: Option<String>,
    pub expiry_date: Option<String>,
    pub name_on_card: Option<String>,
}

impl PaymentReference {
    /// Display-safe summary of a card; the token is attached once the vault issues one.
    pub fn card(card: &CardDetails) -> Self {
        Self {
            method: PaymentMethod::Card,
            token: None,
            last_four: card.last_four(),
            expiry_date: Some(card.expiry_date.clone()),
            name_on_card: Some(card.name_on_card.trim().to_string()),
        }
    }

    pub fn redirect(method: PaymentMethod) -> Self {
        Self {
            method,
            token: None,
            last_four: None,
            expiry_date: None,
            name_on_card: None,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// e.g. `Card ending in 1111` or `PayPal`
    pub fn display_label(&self) -> String {
        match (&self.method, &self.last_four) {
            (PaymentMethod::Card, Some(last_four)) => format!("Card ending in {last_four}"),
            (method, _) => method.display_name().to_string(),
        }
    }
}

/// Exchanges raw card data for an opaque token.
///
/// Takes the card by value: once tokenized the caller no longer holds the number or CVV.
pub trait CardVault: Send + Sync {
    fn tokenize(&self, card: CardDetails) -> CoreResult<String>;
}
