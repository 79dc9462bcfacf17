//! Update Cart Item Handler

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

use crate::{
    carts::{CartEnvelope, errors::into_api_error},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// New quantity, at least one
    pub quantity: u32,
}

/// Update Cart Item Handler
#[endpoint(tags("cart"), summary = "Update Cart Item", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let cart = state
        .app
        .carts
        .update_item(user.uuid, item.into_inner().into(), json.into_inner().quantity)
        .await
        .map_err(into_api_error)?;

    Ok(Json(cart.into()))
}
