use crate::address::{Address, ShippingDetails};
use crate::payment::PaymentReference;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_catalog::{Cart, CartItem, PriceBreakdown, PricingCalculator};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier the gateway assigns to a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Immutable snapshot of an order at the moment it is placed.
///
/// Built once from the checkout draft and moved into the submission gateway.
/// Totals are derived here from the items, never supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "OrderRecord")]
pub struct FinalizedOrder {
    items: Vec<CartItem>,
    shipping: ShippingDetails,
    payment: PaymentReference,
    billing: Address,
    pricing: PriceBreakdown,
    placed_at: DateTime<Utc>,
}

impl FinalizedOrder {
    pub fn new(
        cart: &Cart,
        shipping: ShippingDetails,
        payment: PaymentReference,
        billing: Address,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            items: cart.items().to_vec(),
            pricing: PricingCalculator::quote(cart.items()),
            shipping,
            payment,
            billing,
            placed_at,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn shipping(&self) -> &ShippingDetails {
        &self.shipping
    }

    pub fn payment(&self) -> &PaymentReference {
        &self.payment
    }

    pub fn billing(&self) -> &Address {
        &self.billing
    }

    pub fn pricing(&self) -> &PriceBreakdown {
        &self.pricing
    }

    pub fn total(&self) -> Decimal {
        self.pricing.total
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}

/// Wire form of a finalized order. Any serialized pricing is ignored and derived again.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
    items: Vec<CartItem>,
    shipping: ShippingDetails,
    payment: PaymentReference,
    billing: Address,
    placed_at: DateTime<Utc>,
}

impl From<OrderRecord> for FinalizedOrder {
    fn from(record: OrderRecord) -> Self {
        Self {
            pricing: PricingCalculator::quote(&record.items),
            items: record.items,
            shipping: record.shipping,
            payment: record.payment,
            billing: record.billing,
            placed_at: record.placed_at,
        }
    }
}

/// What a successful submission hands back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    /// Human-facing number, e.g. `SF-2026-000042`
    pub order_number: String,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}
