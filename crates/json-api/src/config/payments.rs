//! Payments Config

use std::time::Duration;

use clap::Args;

use storefront_app::domain::payments::{
    data::CheckoutSettings,
    stripe::{DEFAULT_API_BASE, StripeConfig},
};

/// Payment processor settings.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Stripe secret API key
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: String,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub stripe_api_base: String,

    /// Stripe request timeout in seconds
    #[arg(long, env = "STRIPE_TIMEOUT_SECONDS", default_value_t = 15_u64)]
    pub stripe_timeout_seconds: u64,

    /// Checkout currency (ISO code)
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "inr")]
    pub currency: String,

    /// Storefront origin used for checkout redirects
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    /// Country recorded when a checkout session carries none
    #[arg(long, env = "DEFAULT_COUNTRY", default_value = "India")]
    pub default_country: String,
}

impl PaymentsConfig {
    #[must_use]
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            secret_key: self.stripe_secret_key.clone(),
            api_base: self.stripe_api_base.clone(),
            timeout: Duration::from_secs(self.stripe_timeout_seconds),
        }
    }

    #[must_use]
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            currency: self.currency.to_lowercase(),
            frontend_url: self.frontend_url.clone(),
            default_country: self.default_country.clone(),
        }
    }
}
