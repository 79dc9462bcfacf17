//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, JwtCodec, PgAuthService},
    database::{self, Db, PoolSettings},
    domain::{
        carts::{CartsService, PgCartsService},
        orders::{OrdersService, PgOrdersService},
        payments::{
            GatewayError, PaymentsService, PgPaymentsService,
            data::CheckoutSettings,
            stripe::{StripeClient, StripeConfig},
        },
        pricing::PricingPolicy,
        products::{PgProductsService, ProductsService},
        reviews::{PgReviewsService, ReviewsService},
        users::{PgUsersService, UsersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to build payment gateway client")]
    Gateway(#[source] GatewayError),
}

/// Everything needed to wire the services together.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub pool: PoolSettings,
    pub jwt: JwtCodec,
    pub stripe: StripeConfig,
    pub checkout: CheckoutSettings,
    pub pricing: PricingPolicy,
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentsService>,
    pub reviews: Arc<dyn ReviewsService>,
    pub users: Arc<dyn UsersService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or building
    /// the payment gateway client fails.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect_with(&config.database_url, config.pool)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        let gateway = StripeClient::new(config.stripe).map_err(AppInitError::Gateway)?;

        Ok(Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone(), config.pricing)),
            payments: Arc::new(PgPaymentsService::new(
                db.clone(),
                config.pricing,
                config.checkout,
                Arc::new(gateway),
            )),
            reviews: Arc::new(PgReviewsService::new(db.clone())),
            users: Arc::new(PgUsersService::new(db.clone())),
            auth: Arc::new(PgAuthService::new(db, config.jwt)),
        })
    }
}
