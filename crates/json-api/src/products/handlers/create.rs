//! Create Product Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::products::{data::NewProduct, records::ProductUuid};

use crate::{
    errors::ApiError,
    extensions::*,
    products::{ProductEnvelope, errors::into_api_error, handlers::parse_category},
    state::State,
};

/// Create Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateProductRequest {
    /// Client-chosen identifier; generated when omitted
    #[serde(default)]
    pub uuid: Option<Uuid>,
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
    #[serde(default)]
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

impl CreateProductRequest {
    fn into_new_product(self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            uuid: self.uuid.map_or_else(ProductUuid::new, ProductUuid::from_uuid),
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

/// Create Product Handler
#[endpoint(
    tags("products"),
    summary = "Create Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Product created"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateProductRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let product = state
        .app
        .products
        .create_product(json.into_inner().into_new_product()?)
        .await
        .map_err(into_api_error)?;

    res.add_header(LOCATION, format!("/api/products/{}", product.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(product_uuid = %product.uuid, name = %product.name, "created product");

    Ok(Json(product.into()))
}
