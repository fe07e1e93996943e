use crate::address::{Address, ShippingMethod};
use crate::order::OrderId;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_catalog::CartItem;
use std::fmt;
use std::str::FromStr;

/// Where a placed order is in its fulfillment lifecycle.
///
/// The first five variants are the ordered stages; `Cancelled` and `Returned` are terminal
/// exceptions outside that progression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Confirmed,
    Processing,
    Shipped,
    #[serde(alias = "delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    /// The fixed stage sequence a tracker renders
    pub const STAGES: [OrderStatus; 5] = [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Position in [`OrderStatus::STAGES`]; `None` for the exception statuses.
    pub fn stage_index(&self) -> Option<usize> {
        Self::STAGES.iter().position(|stage| stage == self)
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Forward moves along the stages (skipping is allowed), cancellation before delivery,
    /// and return from any stage. Nothing leaves an exception status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_exception() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => *self != OrderStatus::Delivered,
            OrderStatus::Returned => true,
            _ => match (self.stage_index(), next.stage_index()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    pub fn transition_to(&self, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition { from: *self, to: next })
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "Order Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "✅",
            OrderStatus::Processing => "🔄",
            OrderStatus::Shipped => "📦",
            OrderStatus::OutForDelivery => "🚚",
            OrderStatus::Delivered => "🏠",
            OrderStatus::Cancelled => "✖️",
            OrderStatus::Returned => "↩️",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "out-for-delivery" | "delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "returned" => Ok(OrderStatus::Returned),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// One entry in an order's fulfillment log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub location: Option<String>,
}

impl TimelineEvent {
    pub fn new(status: OrderStatus, occurred_at: DateTime<Utc>, description: impl Into<String>) -> Self {
        Self {
            status,
            occurred_at,
            description: description.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.occurred_at.format("%Y-%m-%d %H:%M UTC"), self.description)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

/// Shipping carrier handling a parcel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Carrier {
    FedEx,
    Ups,
    Usps,
    Dhl,
    Other(String),
}

impl Carrier {
    pub fn name(&self) -> &str {
        match self {
            Carrier::FedEx => "FedEx",
            Carrier::Ups => "UPS",
            Carrier::Usps => "USPS",
            Carrier::Dhl => "DHL",
            Carrier::Other(name) => name,
        }
    }

    /// Public tracking page for a parcel, when the carrier is one we know.
    pub fn tracking_url(&self, tracking_number: &str) -> Option<String> {
        let url = match self {
            Carrier::FedEx => format!("https://www.fedex.com/apps/fedextrack/?tracknumbers={tracking_number}"),
            Carrier::Ups => format!("https://www.ups.com/track?tracknum={tracking_number}"),
            Carrier::Usps => format!("https://tools.usps.com/go/TrackConfirmAction?tLabels={tracking_number}"),
            Carrier::Dhl => format!("https://www.dhl.com/en/express/tracking.html?AWB={tracking_number}"),
            Carrier::Other(_) => return None,
        };
        Some(url)
    }
}

impl From<String> for Carrier {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "fedex" => Carrier::FedEx,
            "ups" => Carrier::Ups,
            "usps" => Carrier::Usps,
            "dhl" => Carrier::Dhl,
            _ => Carrier::Other(name),
        }
    }
}

impl From<Carrier> for String {
    fn from(carrier: Carrier) -> Self {
        carrier.name().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInfo {
    pub address: Address,
    pub method: ShippingMethod,
    pub carrier: Option<Carrier>,
    pub tracking_number: Option<String>,
}

impl ShipmentInfo {
    pub fn tracking_url(&self) -> Option<String> {
        match (&self.carrier, &self.tracking_number) {
            (Some(carrier), Some(number)) => carrier.tracking_url(number),
            _ => None,
        }
    }
}

/// A persisted order as the order-lookup collaborator reports it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub shipment: ShipmentInfo,
    pub items: Vec<CartItem>,
    pub timeline: Vec<TimelineEvent>,
}
