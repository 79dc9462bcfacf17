//! Create Checkout Session Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::payments::data::NewCheckoutSession;

use crate::{
    errors::ApiError,
    extensions::*,
    observability::record_checkout_session_created,
    orders::{ClientPrices, LineItemPayload, ShippingAddressPayload},
    payments::errors::into_api_error,
    state::State,
};

/// Create Checkout Session Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCheckoutSessionRequest {
    #[serde(default, alias = "items")]
    pub cart_items: Vec<LineItemPayload>,
    #[serde(default, alias = "shippingAddress")]
    pub shipping_info: Option<ShippingAddressPayload>,
    /// Pay for this existing unpaid order instead of the cart
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(flatten)]
    pub prices: ClientPrices,
}

impl From<CreateCheckoutSessionRequest> for NewCheckoutSession {
    fn from(request: CreateCheckoutSessionRequest) -> Self {
        NewCheckoutSession {
            client_prices: request.prices.breakdown(),
            items: request.cart_items.into_iter().map(Into::into).collect(),
            shipping_address: request.shipping_info.map(Into::into),
            order_uuid: request.order_id.map(Into::into),
        }
    }
}

/// Checkout Session Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckoutSessionResponse {
    pub success: bool,
    /// Hosted payment page to redirect the customer to
    pub url: Option<String>,
    pub session_id: String,
}

/// Create Checkout Session Handler
///
/// Totals are recomputed from the catalog before the processor is called.
#[endpoint(
    tags("payments"),
    summary = "Create Checkout Session",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCheckoutSessionRequest>,
    depot: &mut Depot,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let session = state
        .app
        .payments
        .create_checkout_session(user.clone(), json.into_inner().into())
        .await
        .map_err(into_api_error)?;

    record_checkout_session_created();

    tracing::info!(
        session_id = %session.session_id,
        user_uuid = %user.uuid,
        total = session.prices.total,
        "created checkout session"
    );

    Ok(Json(CheckoutSessionResponse {
        success: true,
        url: session.url,
        session_id: session.session_id,
    }))
}
