use crate::timeline::{audit_timeline, TimelineIssue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shopfront_catalog::CartItem;
use shopfront_core::{LookupError, OrderId, OrderLookup, OrderStatus, ShipmentInfo, TimelineEvent, TrackedOrder};
use std::time::Duration;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// How one lifecycle stage should be drawn
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StageState {
    Completed,
    Current,
    Pending,
    /// Never reached because the order was cancelled or returned
    Halted,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub status: OrderStatus,
    pub label: &'static str,
    pub icon: &'static str,
    pub state: StageState,
}

/// Everything the tracking screen renders for a found order
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub placed_at: DateTime<Utc>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub current_stage_index: usize,
    pub stages: Vec<StageView>,
    pub timeline: Vec<TimelineEvent>,
    pub shipment: ShipmentInfo,
    pub carrier_tracking_url: Option<String>,
    pub items: Vec<CartItem>,
    pub issues: Vec<TimelineIssue>,
}

impl TrackingView {
    pub fn is_halted(&self) -> bool {
        self.status.is_exception()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum TrackerState {
    Loading,
    NotFound { order_id: OrderId },
    Failed { reason: String },
    Ready(Box<TrackingView>),
}

/// Read-only projection of a placed order onto the five fulfillment stages.
///
/// Status changes happen in the fulfillment backend; the tracker only observes them.
pub struct FulfillmentTracker {
    order_id: OrderId,
    state: TrackerState,
    lookup_timeout: Duration,
}

impl FulfillmentTracker {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            state: TrackerState::Loading,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, TrackerState::Loading)
    }

    pub fn view(&self) -> Option<&TrackingView> {
        match &self.state {
            TrackerState::Ready(view) => Some(view.as_ref()),
            _ => None,
        }
    }

    /// Fetch the order and settle into `Ready`, `NotFound` or `Failed`.
    pub async fn load<L>(&mut self, lookup: &L) -> &TrackerState
    where
        L: OrderLookup + ?Sized,
    {
        self.state = TrackerState::Loading;
        tracing::debug!("Loading tracking data for order {}", self.order_id);

        let result = match tokio::time::timeout(self.lookup_timeout, lookup.lookup(&self.order_id)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::TimedOut(self.lookup_timeout)),
        };

        self.state = match result {
            Ok(Some(order)) => {
                let view = Self::project(order);
                if !view.issues.is_empty() {
                    tracing::warn!("Order {} has an inconsistent timeline: {:?}", view.order_number, view.issues);
                }
                tracing::info!("Order {} is {}", view.order_number, view.status);
                TrackerState::Ready(Box::new(view))
            }
            Ok(None) => {
                tracing::info!("No order found for {}", self.order_id);
                TrackerState::NotFound { order_id: self.order_id }
            }
            Err(e) => {
                tracing::error!("Tracking lookup for {} failed: {}", self.order_id, e);
                TrackerState::Failed { reason: e.to_string() }
            }
        };
        &self.state
    }

    /// Index of the stage the order is on. For cancelled or returned orders this is the
    /// furthest stage the timeline reached.
    pub fn current_stage_index(status: OrderStatus, timeline: &[TimelineEvent]) -> usize {
        status.stage_index().unwrap_or_else(|| {
            timeline
                .iter()
                .filter_map(|event| event.status.stage_index())
                .max()
                .unwrap_or(0)
        })
    }

    pub fn stages(status: OrderStatus, current: usize) -> Vec<StageView> {
        OrderStatus::STAGES
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                let state = if status.is_exception() {
                    if index <= current {
                        StageState::Completed
                    } else {
                        StageState::Halted
                    }
                } else if index < current {
                    StageState::Completed
                } else if index == current {
                    StageState::Current
                } else {
                    StageState::Pending
                };
                StageView {
                    status: *stage,
                    label: stage.label(),
                    icon: stage.icon(),
                    state,
                }
            })
            .collect()
    }

    pub fn project(order: TrackedOrder) -> TrackingView {
        let current = Self::current_stage_index(order.status, &order.timeline);
        let issues = audit_timeline(order.status, &order.timeline);

        TrackingView {
            stages: Self::stages(order.status, current),
            current_stage_index: current,
            status_label: order.status.label(),
            carrier_tracking_url: order.shipment.tracking_url(),
            order_id: order.order_id,
            order_number: order.order_number,
            status: order.status,
            placed_at: order.placed_at,
            estimated_delivery: order.estimated_delivery,
            timeline: order.timeline,
            shipment: order.shipment,
            items: order.items,
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use shopfront_core::{Address, Carrier, ShippingMethod};
    use std::collections::HashMap;

    struct StaticLookup {
        orders: HashMap<OrderId, TrackedOrder>,
    }

    #[async_trait::async_trait]
    impl OrderLookup for StaticLookup {
        async fn lookup(&self, order_id: &OrderId) -> Result<Option<TrackedOrder>, LookupError> {
            Ok(self.orders.get(order_id).cloned())
        }
    }

    struct DownLookup;

    #[async_trait::async_trait]
    impl OrderLookup for DownLookup {
        async fn lookup(&self, _order_id: &OrderId) -> Result<Option<TrackedOrder>, LookupError> {
            Err(LookupError::Unavailable("connection refused".to_string()))
        }
    }

    struct HangingLookup;

    #[async_trait::async_trait]
    impl OrderLookup for HangingLookup {
        async fn lookup(&self, _order_id: &OrderId) -> Result<Option<TrackedOrder>, LookupError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    fn shipped_order() -> TrackedOrder {
        let placed = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        TrackedOrder {
            order_id: OrderId::new(),
            order_number: "SF-2024-001234".to_string(),
            status: OrderStatus::Shipped,
            placed_at: placed,
            estimated_delivery: Some(Utc.with_ymd_and_hms(2024, 1, 20, 18, 0, 0).unwrap()),
            shipment: ShipmentInfo {
                address: Address::new("123 Main Street", "New York", "NY", "10001", "US"),
                method: ShippingMethod::Express,
                carrier: Some(Carrier::FedEx),
                tracking_number: Some("1234567890123456".to_string()),
            },
            items: vec![CartItem::new("1", "Diver Watch", Decimal::from(8500), 1).unwrap()],
            timeline: vec![
                TimelineEvent::new(OrderStatus::Confirmed, placed, "Order confirmed and payment processed"),
                TimelineEvent::new(
                    OrderStatus::Processing,
                    Utc.with_ymd_and_hms(2024, 1, 15, 14, 20, 0).unwrap(),
                    "Order is being prepared",
                ),
                TimelineEvent::new(
                    OrderStatus::Shipped,
                    Utc.with_ymd_and_hms(2024, 1, 16, 9, 15, 0).unwrap(),
                    "Package shipped via FedEx Express",
                )
                .with_location("New York Distribution Center"),
            ],
        }
    }

    fn states(view: &TrackingView) -> Vec<StageState> {
        view.stages.iter().map(|stage| stage.state).collect()
    }

    #[test]
    fn test_shipped_projection() {
        let view = FulfillmentTracker::project(shipped_order());

        assert_eq!(view.current_stage_index, 2);
        assert_eq!(
            states(&view),
            vec![
                StageState::Completed,
                StageState::Completed,
                StageState::Current,
                StageState::Pending,
                StageState::Pending,
            ]
        );
        assert_eq!(view.status_label, "Shipped");
        assert_eq!(view.timeline.len(), 3);
        assert!(view.issues.is_empty());
        assert_eq!(
            view.carrier_tracking_url.as_deref(),
            Some("https://www.fedex.com/apps/fedextrack/?tracknumbers=1234567890123456")
        );
    }

    #[test]
    fn test_delivered_has_nothing_pending() {
        let mut order = shipped_order();
        order.status = OrderStatus::Delivered;
        let view = FulfillmentTracker::project(order);

        assert_eq!(view.current_stage_index, 4);
        assert_eq!(view.stages[4].state, StageState::Current);
        assert!(view.stages.iter().all(|stage| stage.state != StageState::Pending));
    }

    #[test]
    fn test_cancelled_order_halts_remaining_stages() {
        let mut order = shipped_order();
        order.status = OrderStatus::Cancelled;
        order.timeline.push(TimelineEvent::new(
            OrderStatus::Cancelled,
            Utc.with_ymd_and_hms(2024, 1, 17, 8, 0, 0).unwrap(),
            "Cancelled at customer request",
        ));
        let view = FulfillmentTracker::project(order);

        assert!(view.is_halted());
        assert_eq!(view.current_stage_index, 2);
        assert_eq!(
            states(&view),
            vec![
                StageState::Completed,
                StageState::Completed,
                StageState::Completed,
                StageState::Halted,
                StageState::Halted,
            ]
        );
    }

    #[tokio::test]
    async fn test_load_found_order() {
        let order = shipped_order();
        let order_id = order.order_id;
        let lookup = StaticLookup {
            orders: HashMap::from([(order_id, order)]),
        };

        let mut tracker = FulfillmentTracker::new(order_id);
        assert!(tracker.is_loading());

        tracker.load(&lookup).await;
        let view = tracker.view().expect("order should be ready");
        assert_eq!(view.order_number, "SF-2024-001234");
        assert_eq!(view.current_stage_index, 2);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let lookup = StaticLookup { orders: HashMap::new() };
        let order_id = OrderId::new();
        let mut tracker = FulfillmentTracker::new(order_id);

        let state = tracker.load(&lookup).await;
        assert_eq!(state, &TrackerState::NotFound { order_id });
        assert!(!tracker.is_loading());
        assert!(tracker.view().is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_distinct_from_not_found() {
        let mut tracker = FulfillmentTracker::new(OrderId::new());
        let state = tracker.load(&DownLookup).await;

        assert!(matches!(state, TrackerState::Failed { reason } if reason.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let mut tracker = FulfillmentTracker::new(OrderId::new()).with_lookup_timeout(Duration::from_millis(20));
        tracker.load(&HangingLookup).await;

        assert!(matches!(tracker.state(), TrackerState::Failed { .. }));
    }
}
