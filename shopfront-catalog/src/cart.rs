use crate::pricing::PricingCalculator;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line in the shopper's cart, as supplied by the cart collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    /// Price per unit in the store currency.
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<Self, CatalogError> {
        let item = Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
            image: None,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Unit price times quantity, saturating at `Decimal::MAX`
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.quantity == 0 {
            return Err(CatalogError::InvalidQuantity(self.id.clone()));
        }
        if self.unit_price.is_sign_negative() {
            return Err(CatalogError::NegativePrice(self.id.clone()));
        }
        if self.checked_line_total().is_none() {
            return Err(CatalogError::AmountOverflow(self.id.clone()));
        }
        Ok(())
    }
}

/// Ordered, validated snapshot of cart lines handed to checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new(items: Vec<CartItem>) -> Result<Self, CatalogError> {
        for item in &items {
            item.validate()?;
        }
        if PricingCalculator::checked_quote(&items).is_none() {
            return Err(CatalogError::AmountOverflow("cart".to_string()));
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Cart item {0} must have a positive quantity")]
    InvalidQuantity(String),

    #[error("Cart item {0} has a negative price")]
    NegativePrice(String),

    #[error("Amount for {0} is too large to price")]
    AmountOverflow(String),
}
