pub mod address;
pub mod fields;
pub mod order;
pub mod payment;
pub mod repository;
pub mod tracking;

pub use address::{Address, ShippingDetails, ShippingMethod};
pub use fields::FieldErrors;
pub use order::{FinalizedOrder, OrderConfirmation, OrderId};
pub use payment::{CardDetails, CardVault, PaymentDetails, PaymentMethod, PaymentReference};
pub use repository::{LookupError, OrderLookup, OrderSubmissionGateway, SubmissionError};
pub use tracking::{Carrier, OrderStatus, ShipmentInfo, TimelineEvent, TrackedOrder};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Card vault error: {0}")]
    VaultError(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: tracking::OrderStatus,
        to: tracking::OrderStatus,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
