use crate::fields::FieldErrors;
use serde::{Deserialize, Serialize};

pub const FULL_NAME: &str = "fullName";
pub const STREET: &str = "street";
pub const CITY: &str = "city";
pub const STATE: &str = "state";
pub const ZIP_CODE: &str = "zipCode";
pub const COUNTRY: &str = "country";

/// Postal address used for both shipping and billing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
            country: country.into(),
        }
    }

    /// Single-line form, e.g. `123 Main Street, New York, NY 10001`
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street.trim(), self.city.trim(), self.state.trim(), self.zip_code.trim())
    }

    /// True when every field is blank (an untouched form section).
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.zip_code, &self.country]
            .iter()
            .all(|value| value.trim().is_empty())
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, value, label) in [
            (STREET, &self.street, "street address"),
            (CITY, &self.city, "city"),
            (STATE, &self.state, "state"),
            (ZIP_CODE, &self.zip_code, "ZIP code"),
            (COUNTRY, &self.country, "country"),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, format!("Please enter your {label}"));
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "Standard Shipping",
            ShippingMethod::Express => "Express Shipping",
            ShippingMethod::Overnight => "Overnight Shipping",
        }
    }

    /// Business days from placement to the promised delivery date
    pub fn transit_days(&self) -> i64 {
        match self {
            ShippingMethod::Standard => 7,
            ShippingMethod::Express => 3,
            ShippingMethod::Overnight => 1,
        }
    }
}

/// What the shipping step collects: recipient, destination and method.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub address: Address,
    pub method: ShippingMethod,
}

impl ShippingDetails {
    pub fn new(full_name: impl Into<String>, address: Address, method: ShippingMethod) -> Self {
        Self {
            full_name: full_name.into(),
            email: None,
            phone: None,
            address,
            method,
        }
    }

    /// Required-field check; an empty result means the step may complete.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = self.address.validate();
        if self.full_name.trim().is_empty() {
            errors.insert(FULL_NAME, "Please enter the recipient's full name");
        }
        errors
    }
}
