use chrono::Utc;
use shopfront_catalog::Cart;
use shopfront_core::{CardVault, OrderId};
use shopfront_order::{CheckoutState, CheckoutWizard, FulfillmentTracker, PaymentValidator};
use shopfront_store::{Config, InMemoryCardVault, InMemoryOrderStore};
use std::sync::Arc;

/// Shared collaborators every checkout and tracking session is wired to
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orders: Arc<InMemoryOrderStore>,
    pub vault: Arc<InMemoryCardVault>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let orders = Arc::new(InMemoryOrderStore::from_config(&config.store));
        Self {
            config,
            orders,
            vault: Arc::new(InMemoryCardVault::new()),
        }
    }

    /// Start a fresh checkout for `cart`
    pub fn checkout(&self, cart: Cart) -> CheckoutWizard {
        self.configure(CheckoutWizard::new(cart, self.card_vault()))
    }

    /// Pick up a checkout from an exported state
    pub fn resume_checkout(&self, cart: Cart, state: CheckoutState) -> CheckoutWizard {
        self.configure(CheckoutWizard::restore(cart, state, self.card_vault()))
    }

    pub fn tracker(&self, order_id: OrderId) -> FulfillmentTracker {
        FulfillmentTracker::new(order_id).with_lookup_timeout(self.config.tracking.lookup_timeout())
    }

    /// Build a tracker and load it against the order store
    pub async fn track(&self, order_id: OrderId) -> FulfillmentTracker {
        let mut tracker = self.tracker(order_id);
        tracker.load(self.orders.as_ref()).await;
        tracker
    }

    fn card_vault(&self) -> Arc<dyn CardVault> {
        self.vault.clone()
    }

    fn configure(&self, wizard: CheckoutWizard) -> CheckoutWizard {
        let validator = if self.config.checkout.enforce_card_expiry {
            PaymentValidator::with_expiry_check(Utc::now().date_naive())
        } else {
            PaymentValidator::new()
        };
        wizard
            .with_validator(validator)
            .with_submission_timeout(self.config.checkout.submission_timeout())
    }
}
