//! Server configuration module

use clap::Parser;
use jiff::SignedDuration;

use storefront_app::{auth::JwtCodec, context::AppConfig};

use crate::config::{
    auth::AuthConfig,
    cors::CorsConfig,
    db::DatabaseConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    payments::PaymentsConfig,
    pricing::PricingConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod auth;
pub(crate) mod cors;
pub(crate) mod db;
pub(crate) mod observability;
pub(crate) mod payments;
pub(crate) mod pricing;
pub(crate) mod server;

/// Storefront JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-json", about = "Storefront JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Bearer token settings.
    #[command(flatten)]
    pub auth: AuthConfig,

    /// Payment processor settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,

    /// Tax and shipping rules.
    #[command(flatten)]
    pub pricing: PricingConfig,

    /// Cross-origin settings.
    #[command(flatten)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings the domain services are built from.
    #[must_use]
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            database_url: self.database.database_url.clone(),
            pool: self.database.pool_settings(),
            jwt: JwtCodec::new(
                &self.auth.jwt_secret,
                SignedDuration::from_hours(self.auth.jwt_ttl_hours),
            ),
            stripe: self.payments.stripe_config(),
            checkout: self.payments.checkout_settings(),
            pricing: self.pricing.policy(),
        }
    }
}
