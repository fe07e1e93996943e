use crate::app_config::StoreConfig;
use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, Utc};
use shopfront_core::{
    Carrier, CoreError, FinalizedOrder, LookupError, OrderConfirmation, OrderId, OrderLookup, OrderStatus,
    OrderSubmissionGateway, ShipmentInfo, SubmissionError, TimelineEvent, TrackedOrder,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error(transparent)]
    Transition(#[from] CoreError),
}

struct StoredOrder {
    finalized: FinalizedOrder,
    tracked: TrackedOrder,
}

/// In-memory order backend.
///
/// Accepts submissions, serves tracking lookups and lets callers drive the fulfillment
/// lifecycle the way a warehouse or carrier feed would. Orders live for the life of the process.
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, StoredOrder>>,
    sequence: AtomicU64,
    prefix: String,
    processing_delay: Duration,
    available: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            prefix: prefix.into(),
            processing_delay: Duration::ZERO,
            available: AtomicBool::new(true),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.order_number_prefix.clone()).with_processing_delay(config.processing_delay())
    }

    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    /// Take the store offline (or back online). Offline, every call fails as unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if !available {
            warn!("Order store marked unavailable");
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// The order exactly as the checkout submitted it
    pub async fn finalized(&self, order_id: &OrderId) -> Option<FinalizedOrder> {
        self.orders
            .read()
            .await
            .get(order_id)
            .map(|stored| stored.finalized.clone())
    }

    /// Move an order to `status` and append the matching timeline entry.
    pub async fn advance_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        description: impl Into<String>,
        location: Option<String>,
    ) -> Result<TrackedOrder, StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(order_id).ok_or(StoreError::NotFound(*order_id))?;
        record(&mut stored.tracked, status, description.into(), location)
    }

    /// Hand the parcel to a carrier: records the tracking number and moves the order to shipped.
    pub async fn ship(
        &self,
        order_id: &OrderId,
        carrier: Carrier,
        tracking_number: impl Into<String>,
        location: Option<String>,
    ) -> Result<TrackedOrder, StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(order_id).ok_or(StoreError::NotFound(*order_id))?;
        let tracked = &mut stored.tracked;
        tracked.status.transition_to(OrderStatus::Shipped)?;

        let description = format!("Package shipped via {} {}", carrier.name(), tracked.shipment.method.label());
        tracked.shipment.carrier = Some(carrier);
        tracked.shipment.tracking_number = Some(tracking_number.into());
        record(tracked, OrderStatus::Shipped, description, location)
    }

    fn next_order_number(&self, year: i32) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}-{:06}", self.prefix, year, sequence)
    }

    async fn simulate_latency(&self) {
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
    }
}

fn record(
    tracked: &mut TrackedOrder,
    status: OrderStatus,
    description: String,
    location: Option<String>,
) -> Result<TrackedOrder, StoreError> {
    tracked.status = tracked.status.transition_to(status)?;

    let mut event = TimelineEvent::new(status, Utc::now(), description);
    if let Some(location) = location {
        event = event.with_location(location);
    }
    tracked.timeline.push(event);

    info!("Order {} moved to {}", tracked.order_number, status);
    Ok(tracked.clone())
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

#[async_trait]
impl OrderSubmissionGateway for InMemoryOrderStore {
    async fn submit(&self, order: FinalizedOrder) -> Result<OrderConfirmation, SubmissionError> {
        self.simulate_latency().await;

        if !self.is_available() {
            return Err(SubmissionError::Unavailable("order store is offline".to_string()));
        }
        if order.items().is_empty() {
            return Err(SubmissionError::Rejected("order has no items".to_string()));
        }

        let order_id = OrderId::new();
        let placed_at = order.placed_at();
        let order_number = self.next_order_number(placed_at.year());
        let method = order.shipping().method;

        let tracked = TrackedOrder {
            order_id,
            order_number: order_number.clone(),
            status: OrderStatus::Confirmed,
            placed_at,
            estimated_delivery: Some(placed_at + ChronoDuration::days(method.transit_days())),
            shipment: ShipmentInfo {
                address: order.shipping().address.clone(),
                method,
                carrier: None,
                tracking_number: None,
            },
            items: order.items().to_vec(),
            timeline: vec![TimelineEvent::new(
                OrderStatus::Confirmed,
                placed_at,
                "Order confirmed and payment processed",
            )],
        };

        let confirmation = OrderConfirmation {
            order_id,
            order_number,
            total: order.total(),
            placed_at,
        };

        self.orders.write().await.insert(
            order_id,
            StoredOrder {
                finalized: order,
                tracked,
            },
        );

        info!("Order {} accepted ({})", confirmation.order_number, confirmation.order_id);
        Ok(confirmation)
    }
}

#[async_trait]
impl OrderLookup for InMemoryOrderStore {
    async fn lookup(&self, order_id: &OrderId) -> Result<Option<TrackedOrder>, LookupError> {
        self.simulate_latency().await;

        if !self.is_available() {
            return Err(LookupError::Unavailable("order store is offline".to_string()));
        }
        Ok(self
            .orders
            .read()
            .await
            .get(order_id)
            .map(|stored| stored.tracked.clone()))
    }
}
