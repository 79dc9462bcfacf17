//! Pricing Config

use clap::Args;

use storefront_app::domain::pricing::PricingPolicy;

/// Tax and shipping rules. Amounts are in the currency's minor unit.
#[derive(Debug, Args)]
pub struct PricingConfig {
    /// Tax rate in basis points (1800 = 18%)
    #[arg(long, env = "TAX_RATE_BPS", default_value_t = 1800_u32)]
    pub tax_rate_bps: u32,

    /// Item subtotals strictly above this ship for free
    #[arg(long, env = "FREE_SHIPPING_THRESHOLD", default_value_t = 100_000_u64)]
    pub free_shipping_threshold: u64,

    /// Flat shipping fee charged at or below the threshold
    #[arg(long, env = "FLAT_SHIPPING_FEE", default_value_t = 5_000_u64)]
    pub flat_shipping_fee: u64,
}

impl PricingConfig {
    #[must_use]
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate_bps: self.tax_rate_bps,
            free_shipping_threshold: self.free_shipping_threshold,
            flat_shipping_fee: self.flat_shipping_fee,
        }
    }
}
