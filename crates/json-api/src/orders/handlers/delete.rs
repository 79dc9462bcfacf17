//! Delete Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError, extensions::*, orders::errors::into_api_error, responses::MessageResponse,
    state::State,
};

/// Delete Order Handler
#[endpoint(tags("orders"), summary = "Delete Order", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let order = order.into_inner();

    state
        .app
        .orders
        .delete_order(user.actor(), order.into())
        .await
        .map_err(into_api_error)?;

    tracing::info!(order_uuid = %order, user_uuid = %user.uuid, "deleted order");

    Ok(Json(MessageResponse::new("Order deleted successfully")))
}
