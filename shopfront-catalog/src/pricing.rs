use crate::cart::CartItem;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat sales tax applied to the merchandise subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Subtotals strictly above this amount ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Shipping fee charged at or below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Derived money values for a cart, all rounded to cents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    pub fn is_free_shipping(&self) -> bool {
        self.shipping_fee.is_zero()
    }

    /// Shipping line as the order summary shows it ("FREE" or "$25.00")
    pub fn shipping_label(&self) -> String {
        if self.is_free_shipping() {
            "FREE".to_string()
        } else {
            format_money(self.shipping_fee)
        }
    }
}

/// Stateless price derivation over cart lines.
///
/// Every screen that shows a total (review step, sidebar summary, payment redirect notice)
/// goes through [`PricingCalculator::quote`], so the same cart always yields the same cents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingCalculator;

impl PricingCalculator {
    pub fn subtotal(items: &[CartItem]) -> Decimal {
        let sum = items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total()));
        to_cents(sum)
    }

    pub fn tax(subtotal: Decimal) -> Decimal {
        to_cents(subtotal.saturating_mul(TAX_RATE))
    }

    pub fn shipping_fee(subtotal: Decimal) -> Decimal {
        if subtotal > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_FEE
        }
    }

    /// Full breakdown; `total` is always `subtotal + tax + shipping_fee`.
    pub fn quote(items: &[CartItem]) -> PriceBreakdown {
        let subtotal = Self::subtotal(items);
        let tax = Self::tax(subtotal);
        let shipping_fee = Self::shipping_fee(subtotal);

        PriceBreakdown {
            subtotal,
            tax,
            shipping_fee,
            total: subtotal.saturating_add(tax).saturating_add(shipping_fee),
        }
    }

    /// Like [`PricingCalculator::quote`], but `None` when any amount would exceed
    /// `Decimal::MAX` instead of saturating.
    pub fn checked_quote(items: &[CartItem]) -> Option<PriceBreakdown> {
        let sum = items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.checked_line_total()?)
        })?;
        let subtotal = to_cents(sum);
        let tax = to_cents(subtotal.checked_mul(TAX_RATE)?);
        let shipping_fee = Self::shipping_fee(subtotal);

        Some(PriceBreakdown {
            subtotal,
            tax,
            shipping_fee,
            total: subtotal.checked_add(tax)?.checked_add(shipping_fee)?,
        })
    }

    pub fn total(items: &[CartItem]) -> Decimal {
        Self::quote(items).total
    }
}

fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as dollars with two decimals, e.g. `$648.00`.
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", to_cents(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Decimal, quantity: u32) -> CartItem {
        CartItem::new("sku", "Item", price, quantity).unwrap()
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        let quote = PricingCalculator::quote(&[item(Decimal::from(600), 1)]);

        assert_eq!(quote.subtotal, Decimal::new(60000, 2));
        assert_eq!(quote.tax, Decimal::new(4800, 2));
        assert_eq!(quote.shipping_fee, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::new(64800, 2));
        assert_eq!(quote.shipping_label(), "FREE");
    }

    #[test]
    fn test_flat_fee_below_threshold() {
        let quote = PricingCalculator::quote(&[item(Decimal::from(100), 2)]);

        assert_eq!(quote.subtotal, Decimal::from(200));
        assert_eq!(quote.tax, Decimal::from(16));
        assert_eq!(quote.shipping_fee, Decimal::from(25));
        assert_eq!(quote.total, Decimal::from(241));
        assert_eq!(quote.shipping_label(), "$25.00");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let quote = PricingCalculator::quote(&[item(Decimal::from(250), 2)]);
        assert_eq!(quote.shipping_fee, FLAT_SHIPPING_FEE);
        assert_eq!(quote.total, Decimal::from(565));
    }

    #[test]
    fn test_total_matches_formula_and_is_stable() {
        let items = vec![
            item(Decimal::new(1999, 2), 3),
            item(Decimal::new(405, 2), 1),
            item(Decimal::new(12345, 2), 4),
        ];
        let subtotal = Decimal::new(1999, 2) * Decimal::from(3)
            + Decimal::new(405, 2)
            + Decimal::new(12345, 2) * Decimal::from(4);
        let expected = (subtotal * Decimal::new(108, 2))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let first = PricingCalculator::quote(&items);
        let second = PricingCalculator::quote(&items);

        assert_eq!(first, second);
        assert_eq!(first.total, expected);
        assert_eq!(first.total, first.subtotal + first.tax + first.shipping_fee);
    }

    #[test]
    fn test_sub_cent_tax_rounds_half_away_from_zero() {
        // 0.8048 -> 0.80, 0.8056 -> 0.81, 0.005 -> 0.01
        assert_eq!(PricingCalculator::tax(Decimal::new(1006, 2)), Decimal::new(80, 2));
        assert_eq!(PricingCalculator::tax(Decimal::new(1007, 2)), Decimal::new(81, 2));
        assert_eq!(PricingCalculator::tax(Decimal::new(625, 4)), Decimal::new(1, 2));
    }

    #[test]
    fn test_empty_cart_still_charges_shipping() {
        let quote = PricingCalculator::quote(&[]);
        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.total, FLAT_SHIPPING_FEE);
    }

    #[test]
    fn test_oversized_lines_never_panic() {
        // Built directly, bypassing validation
        let huge = CartItem {
            id: "x".to_string(),
            name: "Big".to_string(),
            unit_price: Decimal::MAX,
            quantity: 2,
            image: None,
        };

        let quote = PricingCalculator::quote(&[huge.clone()]);
        assert_eq!(quote.total, Decimal::MAX);
        assert_eq!(PricingCalculator::checked_quote(&[huge]), None);
    }

    #[test]
    fn test_checked_quote_matches_quote() {
        let items = vec![item(Decimal::new(1999, 2), 3), item(Decimal::from(600), 1)];
        assert_eq!(PricingCalculator::checked_quote(&items), Some(PricingCalculator::quote(&items)));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(64800, 2)), "$648.00");
        assert_eq!(format_money(Decimal::from(25)), "$25.00");
    }
}
