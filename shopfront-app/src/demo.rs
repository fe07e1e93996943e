//! Scripted storefront session: one checkout followed by fulfillment tracking.

use crate::state::AppState;
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use shopfront_catalog::{format_money, Cart, CartItem};
use shopfront_core::{Address, CardDetails, Carrier, OrderStatus, PaymentDetails, ShippingDetails, ShippingMethod};
use shopfront_order::{CheckoutError, StepData, TrackerState};
use tracing::{info, warn};

pub fn sample_cart() -> anyhow::Result<Cart> {
    let items = vec![
        CartItem::new("1", "Diver Watch", Decimal::from(8500), 1)?.with_image("/watch1.jpg"),
        CartItem::new("2", "Leather Strap", Decimal::new(12000, 2), 2)?,
    ];
    Ok(Cart::new(items)?)
}

pub fn sample_shipping() -> ShippingDetails {
    let mut shipping = ShippingDetails::new(
        "Jane Doe",
        Address::new("123 Main Street", "New York", "NY", "10001", "US"),
        ShippingMethod::Express,
    );
    shipping.email = Some("jane@example.com".to_string());
    shipping
}

/// A card that stays valid for a couple of years from today
pub fn sample_card() -> CardDetails {
    let today = Utc::now();
    let expiry = format!("{:02}/{:02}", today.month(), (today.year() + 2) % 100);
    CardDetails::new("4111 1111 1111 1111", expiry, "123", "Jane Doe")
}

pub async fn run(state: &AppState) -> anyhow::Result<()> {
    let mut wizard = state.checkout(sample_cart()?);

    let summary = wizard.summary();
    info!(
        "Cart: {} item(s), subtotal {}, tax {}, shipping {}, total {}",
        wizard.cart().unit_count(),
        format_money(summary.subtotal),
        format_money(summary.tax),
        summary.shipping_label(),
        format_money(summary.total)
    );

    wizard.advance(StepData::Shipping(sample_shipping()))?;

    // A mistyped card first, to show field-level feedback
    let typo = CardDetails::new("4111 1111", "1/27", "12", "Jane Doe");
    match wizard.advance(StepData::Payment(PaymentDetails::card(typo))) {
        Err(CheckoutError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                warn!("{}: {}", field, message);
            }
        }
        other => anyhow::bail!("expected the mistyped card to be rejected, got {:?}", other),
    }

    wizard.advance(StepData::Payment(PaymentDetails::card(sample_card())))?;
    wizard.advance(StepData::Review)?;

    let confirmation = wizard.place_order(state.orders.as_ref()).await?;
    info!(
        "Placed order {} for {}",
        confirmation.order_number,
        format_money(confirmation.total)
    );

    let order_id = confirmation.order_id;
    state
        .orders
        .advance_status(&order_id, OrderStatus::Processing, "Order is being prepared", None)
        .await?;
    state
        .orders
        .ship(
            &order_id,
            Carrier::FedEx,
            "1234567890123456",
            Some("New York Distribution Center".to_string()),
        )
        .await?;

    let tracker = state.track(order_id).await;
    match tracker.state() {
        TrackerState::Ready(view) => {
            for stage in &view.stages {
                info!("{} {} [{:?}]", stage.icon, stage.label, stage.state);
            }
            for event in &view.timeline {
                info!("{}", event);
            }
            if let Some(url) = &view.carrier_tracking_url {
                info!("Track with carrier: {}", url);
            }
            println!("{}", serde_json::to_string_pretty(view)?);
        }
        other => anyhow::bail!("tracking did not load: {:?}", other),
    }

    Ok(())
}
