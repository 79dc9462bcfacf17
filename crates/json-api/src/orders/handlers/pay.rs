//! Pay Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::data::PaymentUpdate;

use crate::{
    errors::ApiError,
    extensions::*,
    orders::{OrderEnvelope, errors::into_api_error},
    state::State,
};

/// Pay Order Request
///
/// The payment result as reported by the processor.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PayOrderRequest {
    /// Processor payment id
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "update_time")]
    pub update_time: Option<String>,
    #[serde(default, alias = "email_address")]
    pub email_address: Option<String>,
}

impl From<PayOrderRequest> for PaymentUpdate {
    fn from(request: PayOrderRequest) -> Self {
        PaymentUpdate {
            reference: request.id,
            status: request.status,
            update_time: request.update_time,
            email: request.email_address,
        }
    }
}

/// Pay Order Handler
///
/// Paying an already paid order returns it unchanged.
#[endpoint(tags("orders"), summary = "Pay Order", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<PayOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let request = json.into_inner();

    if request.id.trim().is_empty() {
        return Err(ApiError::bad_request("Payment id is required"));
    }

    let order = state
        .app
        .orders
        .pay_order(user.actor(), order.into_inner().into(), request.into())
        .await
        .map_err(into_api_error)?;

    tracing::info!(order_uuid = %order.uuid, "recorded order payment");

    Ok(Json(order.into()))
}
