//! Featured Products Handler

use std::sync::Arc;

use salvo::prelude::*;

use storefront_app::domain::products::data::ProductFilter;

use crate::{
    errors::ApiError,
    extensions::*,
    products::{errors::into_api_error, index::ProductsResponse},
    state::State,
};

/// Featured Products Handler
#[endpoint(tags("products"), summary = "List Featured Products")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<ProductsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let products = state
        .app
        .products
        .list_products(ProductFilter {
            featured: Some(true),
            ..ProductFilter::default()
        })
        .await
        .map_err(into_api_error)?;

    Ok(Json(ProductsResponse::new(products)))
}
