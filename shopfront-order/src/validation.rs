use chrono::{Datelike, NaiveDate};
use shopfront_core::payment::{CARD_NUMBER, CVV, EXPIRY_DATE, NAME_ON_CARD};
use shopfront_core::{CardDetails, FieldErrors, PaymentDetails, PaymentMethod};

const MIN_CARD_NUMBER_LEN: usize = 16;
const MIN_CVV_LEN: usize = 3;

/// Format rules for the payment step.
///
/// Only card payments are checked; wallet methods redirect to the provider and always pass.
/// The calendar rule (real month, not yet expired) is opt-in through
/// [`PaymentValidator::with_expiry_check`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentValidator {
    today: Option<NaiveDate>,
}

impl PaymentValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also reject impossible months and cards that expired before `today`'s month.
    pub fn with_expiry_check(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    pub fn validate(&self, details: &PaymentDetails) -> FieldErrors {
        if details.method != PaymentMethod::Card {
            return FieldErrors::new();
        }
        self.validate_card(&details.card)
    }

    pub fn validate_card(&self, card: &CardDetails) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if card.normalized_number().chars().count() < MIN_CARD_NUMBER_LEN {
            errors.insert(CARD_NUMBER, "Please enter a valid card number");
        }

        let expiry = card.expiry_date.trim();
        if !is_mm_yy(expiry) {
            errors.insert(EXPIRY_DATE, "Please enter expiry date (MM/YY)");
        } else if let Some(today) = self.today {
            if let Some(message) = calendar_error(expiry, today) {
                errors.insert(EXPIRY_DATE, message);
            }
        }

        let cvv = card.cvv.expose().trim();
        if cvv.len() < MIN_CVV_LEN || !cvv.chars().all(|c| c.is_ascii_digit()) {
            errors.insert(CVV, "Please enter a valid CVV");
        }

        if card.name_on_card.trim().is_empty() {
            errors.insert(NAME_ON_CARD, "Please enter the name on card");
        }

        errors
    }
}

/// Two digits, a slash, two digits
fn is_mm_yy(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'/'
        && [bytes[0], bytes[1], bytes[3], bytes[4]].iter().all(u8::is_ascii_digit)
}

fn calendar_error(expiry: &str, today: NaiveDate) -> Option<&'static str> {
    let month: u32 = expiry[..2].parse().ok()?;
    let year: i32 = 2000 + expiry[3..].parse::<i32>().ok()?;

    if !(1..=12).contains(&month) {
        return Some("Please enter a valid expiry month");
    }
    // Cards are valid through the last day of their expiry month.
    if (year, month) < (today.year(), today.month()) {
        return Some("This card has expired");
    }
    None
}
