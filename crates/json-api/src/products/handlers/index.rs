//! Product Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use storefront_app::domain::products::{data::ProductFilter, records::ProductRecord};

use crate::{
    errors::ApiError,
    extensions::*,
    products::{ProductResponse, errors::into_api_error, handlers::parse_category},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductsResponse {
    pub success: bool,

    /// Number of products returned
    pub count: usize,

    /// The list of products
    pub products: Vec<ProductResponse>,
}

impl ProductsResponse {
    pub(super) fn new(products: Vec<ProductRecord>) -> Self {
        Self {
            success: true,
            count: products.len(),
            products: products.into_iter().map(Into::into).collect(),
        }
    }
}

/// Product Index Handler
///
/// Returns active products, featured first and then newest. `search` matches
/// the name, description, series or a tag; `series` matches a series exactly.
#[endpoint(tags("products"), summary = "List Products")]
pub(crate) async fn handler(
    category: QueryParam<String, false>,
    series: QueryParam<String, false>,
    featured: QueryParam<bool, false>,
    search: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<ProductsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let filter = ProductFilter {
        category: category
            .into_inner()
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_category(&value))
            .transpose()?,
        anime_series: series.into_inner(),
        featured: featured.into_inner(),
        search: search.into_inner(),
    };

    let products = state
        .app
        .products
        .list_products(filter)
        .await
        .map_err(into_api_error)?;

    Ok(Json(ProductsResponse::new(products)))
}
