//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::carts::{data::NewCartItem, records::CartItemUuid};

use crate::{
    carts::{CartEnvelope, errors::into_api_error},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItemRequest {
    #[serde(alias = "productId")]
    pub product_uuid: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Add Cart Item Handler
///
/// Merges into an existing line with the same product, size and color.
#[endpoint(tags("cart"), summary = "Add Cart Item", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let request = json.into_inner();

    let cart = state
        .app
        .carts
        .add_item(
            user.uuid,
            NewCartItem {
                uuid: CartItemUuid::new(),
                product_uuid: request.product_uuid.into(),
                quantity: request.quantity,
                size: request.size,
                color: request.color,
            },
        )
        .await
        .map_err(into_api_error)?;

    tracing::debug!(user_uuid = %user.uuid, product_uuid = %request.product_uuid, "added cart item");

    Ok(Json(cart.into()))
}
