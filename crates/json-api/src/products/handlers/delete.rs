//! Delete Product Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError, extensions::*, products::errors::into_api_error, responses::MessageResponse,
    state::State,
};

/// Delete Product Handler
///
/// Soft-deletes the product. Orders keep their snapshot of it.
#[endpoint(
    tags("products"),
    summary = "Delete Product",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let product = product.into_inner();

    state
        .app
        .products
        .delete_product(product.into())
        .await
        .map_err(into_api_error)?;

    tracing::info!(product_uuid = %product, "deleted product");

    Ok(Json(MessageResponse::new("Product removed")))
}
