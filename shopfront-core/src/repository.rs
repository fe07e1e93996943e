use crate::order::{FinalizedOrder, OrderConfirmation, OrderId};
use crate::tracking::TrackedOrder;
use async_trait::async_trait;
use std::time::Duration;

/// Accepts a finalized order and places it with the backend
#[async_trait]
pub trait OrderSubmissionGateway: Send + Sync {
    /// Submit an order. The order is moved in; the caller keeps no copy.
    async fn submit(&self, order: FinalizedOrder) -> Result<OrderConfirmation, SubmissionError>;
}

/// Read access to placed orders and their fulfillment timelines
#[async_trait]
pub trait OrderLookup: Send + Sync {
    /// `Ok(None)` means no order exists for this identifier.
    async fn lookup(&self, order_id: &OrderId) -> Result<Option<TrackedOrder>, LookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Order service unavailable: {0}")]
    Unavailable(String),

    #[error("Order submission timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Order lookup unavailable: {0}")]
    Unavailable(String),

    #[error("Order lookup timed out after {0:?}")]
    TimedOut(Duration),
}
