pub mod models;
pub mod validation;
pub mod input;
pub mod checkout;
pub mod timeline;
pub mod fulfillment;

pub use models::{CheckoutState, CheckoutStep, OrderDraft, StepData, StepProgress};
pub use validation::PaymentValidator;
pub use checkout::{CheckoutError, CheckoutWizard};
pub use timeline::{audit_timeline, TimelineIssue};
pub use fulfillment::{FulfillmentTracker, StageState, StageView, TrackerState, TrackingView};
