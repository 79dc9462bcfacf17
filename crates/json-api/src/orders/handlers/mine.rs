//! My Orders Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    errors::ApiError,
    extensions::*,
    orders::{OrdersEnvelope, errors::into_api_error},
    state::State,
};

/// My Orders Handler
///
/// The caller's orders, newest first.
#[endpoint(tags("orders"), summary = "List My Orders", security(("bearer_auth" = [])))]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<OrdersEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let orders = state
        .app
        .orders
        .list_orders_for_user(user.uuid)
        .await
        .map_err(into_api_error)?;

    Ok(Json(orders.into()))
}
