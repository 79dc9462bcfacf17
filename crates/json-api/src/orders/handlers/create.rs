//! Create Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use storefront_app::domain::orders::{data::NewOrder, records::OrderUuid};

use crate::{
    errors::ApiError,
    extensions::*,
    observability::record_order_created,
    orders::{
        ClientPrices, LineItemPayload, OrderEnvelope, ShippingAddressPayload,
        errors::into_api_error,
    },
    state::State,
};

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderRequest {
    #[serde(default)]
    pub order_items: Vec<LineItemPayload>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddressPayload>,
    /// Defaults to `card`
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(flatten)]
    pub prices: ClientPrices,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        NewOrder {
            uuid: OrderUuid::new(),
            client_prices: request.prices.breakdown(),
            items: request.order_items.into_iter().map(Into::into).collect(),
            shipping_address: request.shipping_address.map(Into::into),
            payment_method: request.payment_method,
        }
    }
}

/// Create Order Handler
///
/// Prices are computed from the catalog. Any client totals are advisory.
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let order = state
        .app
        .orders
        .create_order(user.uuid, json.into_inner().into())
        .await
        .map_err(into_api_error)?;

    record_order_created();

    res.add_header(LOCATION, format!("/api/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(
        order_uuid = %order.uuid,
        user_uuid = %user.uuid,
        total = order.prices.total,
        "created order"
    );

    Ok(Json(order.into()))
}
