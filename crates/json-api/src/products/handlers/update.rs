//! Update Product Handler

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

use storefront_app::domain::products::data::ProductUpdate;

use crate::{
    errors::ApiError,
    extensions::*,
    products::{ProductEnvelope, errors::into_api_error, handlers::parse_category},
    state::State,
};

/// Update Product Request
///
/// Replaces every editable field.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub anime_series: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: u64,
    #[serde(default)]
    pub discount_price: Option<u64>,
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl UpdateProductRequest {
    fn into_update(self) -> Result<ProductUpdate, ApiError> {
        Ok(ProductUpdate {
            category: parse_category(&self.category)?,
            name: self.name,
            description: self.description,
            anime_series: self.anime_series,
            image: self.image,
            price: self.price,
            discount_price: self.discount_price,
            stock: self.stock,
            sizes: self.sizes,
            colors: self.colors,
            tags: self.tags,
            is_featured: self.is_featured,
        })
    }
}

/// Product Update Handler
#[endpoint(
    tags("products"),
    summary = "Update Product",
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(
    name = "products.update",
    skip(product, json, depot),
    fields(product_uuid = tracing::field::Empty, price = tracing::field::Empty),
    err(Debug)
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<UpdateProductRequest>,
    depot: &mut Depot,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();
    let product = product.into_inner();

    let span = tracing::Span::current();

    span.record("product_uuid", tracing::field::display(product));
    span.record("price", request.price);

    let updated = state
        .app
        .products
        .update_product(product.into(), request.into_update()?)
        .await
        .map_err(into_api_error)?;

    tracing::info!(product_uuid = %product, price = updated.price, stock = updated.stock, "updated product");

    Ok(Json(updated.into()))
}
