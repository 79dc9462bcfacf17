//! Get Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError,
    extensions::*,
    orders::{OrderEnvelope, errors::into_api_error},
    state::State,
};

/// Get Order Handler
///
/// Visible to the order's owner and to admins.
#[endpoint(tags("orders"), summary = "Get Order", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let order = state
        .app
        .orders
        .get_order(user.actor(), order.into_inner().into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(order.into()))
}
