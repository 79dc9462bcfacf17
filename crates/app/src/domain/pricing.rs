//! Pricing
//!
//! Every amount is an integer in the currency's minor unit. The server is the
//! only place a breakdown is computed; client-supplied totals are compared
//! against it but never stored.

use serde::{Deserialize, Serialize};

/// Basis points in one whole (100%).
pub const BASIS_POINTS: u64 = 10_000;

/// Label of the synthetic shipping line sent to the payment processor.
pub const SHIPPING_LINE_LABEL: &str = "Shipping Charges";

/// Tax and shipping rules applied to an items subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: u32,

    /// Subtotals strictly above this amount ship for free.
    pub free_shipping_threshold: u64,

    /// Shipping charged at or below the threshold.
    pub flat_shipping_fee: u64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_bps: 1800,
            free_shipping_threshold: 100_000,
            flat_shipping_fee: 5_000,
        }
    }
}

impl PricingPolicy {
    /// Tax on `items`, rounded half up.
    #[must_use]
    pub fn tax_for(&self, items: u64) -> u64 {
        let scaled = u128::from(items) * u128::from(self.tax_rate_bps);
        let rounded = (scaled + u128::from(BASIS_POINTS / 2)) / u128::from(BASIS_POINTS);

        u64::try_from(rounded).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn shipping_for(&self, items: u64) -> u64 {
        if items > self.free_shipping_threshold {
            0
        } else {
            self.flat_shipping_fee
        }
    }

    /// The authoritative breakdown for an items subtotal.
    #[must_use]
    pub fn quote(&self, items: u64) -> PriceBreakdown {
        PriceBreakdown::from_parts(items, self.tax_for(items), self.shipping_for(items))
    }

    /// Processor-facing label for the tax line, e.g. `GST (18%)`.
    #[must_use]
    pub fn tax_line_label(&self) -> String {
        let whole = self.tax_rate_bps / 100;
        let fraction = self.tax_rate_bps % 100;

        if fraction == 0 {
            format!("GST ({whole}%)")
        } else if fraction % 10 == 0 {
            format!("GST ({whole}.{}%)", fraction / 10)
        } else {
            format!("GST ({whole}.{fraction:02}%)")
        }
    }
}

/// Items, tax, shipping and their total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub items: u64,
    pub tax: u64,
    pub shipping: u64,
    pub total: u64,
}

impl PriceBreakdown {
    #[must_use]
    pub fn from_parts(items: u64, tax: u64, shipping: u64) -> Self {
        Self {
            items,
            tax,
            shipping,
            total: items.saturating_add(tax).saturating_add(shipping),
        }
    }

    /// `total == items + tax + shipping`, without overflow.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.items
            .checked_add(self.tax)
            .and_then(|sum| sum.checked_add(self.shipping))
            == Some(self.total)
    }
}

/// Sum of `unit_price * quantity` over the given lines.
pub fn items_subtotal<I>(lines: I) -> u64
where
    I: IntoIterator<Item = (u64, u32)>,
{
    lines.into_iter().fold(0_u64, |acc, (unit_price, quantity)| {
        acc.saturating_add(unit_price.saturating_mul(u64::from(quantity)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_above_threshold_ships_free() {
        let breakdown = PricingPolicy::default().quote(480_000);

        assert_eq!(breakdown.items, 480_000);
        assert_eq!(breakdown.tax, 86_400);
        assert_eq!(breakdown.shipping, 0);
        assert_eq!(breakdown.total, 566_400);
        assert!(breakdown.is_consistent());
    }

    #[test]
    fn quote_at_threshold_charges_flat_fee() {
        let breakdown = PricingPolicy::default().quote(100_000);

        assert_eq!(breakdown.shipping, 5_000);
        assert_eq!(breakdown.total, 100_000 + 18_000 + 5_000);
    }

    #[test]
    fn quote_just_above_threshold_ships_free() {
        let breakdown = PricingPolicy::default().quote(100_001);

        assert_eq!(breakdown.shipping, 0);
    }

    #[test]
    fn tax_rounds_half_up() {
        let policy = PricingPolicy::default();

        // 25 * 0.18 = 4.5
        assert_eq!(policy.tax_for(25), 5);
        // 24 * 0.18 = 4.32
        assert_eq!(policy.tax_for(24), 4);
        // 36 * 0.18 = 6.48
        assert_eq!(policy.tax_for(36), 6);
    }

    #[test]
    fn tax_does_not_overflow_on_large_subtotals() {
        let policy = PricingPolicy::default();

        assert!(policy.tax_for(u64::MAX) > 0);
    }

    #[test]
    fn every_quote_is_consistent() {
        let policy = PricingPolicy::default();

        for items in [0, 1, 99, 4_999, 100_000, 100_001, 7_654_321] {
            assert!(policy.quote(items).is_consistent(), "quote({items})");
        }
    }

    #[test]
    fn inconsistent_breakdown_is_detected() {
        let breakdown = PriceBreakdown {
            items: 100,
            tax: 18,
            shipping: 50,
            total: 100,
        };

        assert!(!breakdown.is_consistent());
    }

    #[test]
    fn tax_line_label_reflects_rate() {
        let mut policy = PricingPolicy::default();
        assert_eq!(policy.tax_line_label(), "GST (18%)");

        policy.tax_rate_bps = 1250;
        assert_eq!(policy.tax_line_label(), "GST (12.5%)");

        policy.tax_rate_bps = 1225;
        assert_eq!(policy.tax_line_label(), "GST (12.25%)");
    }

    #[test]
    fn subtotal_multiplies_quantities() {
        let subtotal = items_subtotal([(1_200, 2), (2_400, 1)]);

        assert_eq!(subtotal, 4_800);
    }
}
