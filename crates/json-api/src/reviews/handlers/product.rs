//! Product Reviews Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{PathParam, QueryParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::reviews::data::{PageRequest, ReviewPage};

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::{ReviewResponse, errors::into_api_error},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewsResponse {
    pub success: bool,
    pub reviews: Vec<ReviewResponse>,
    pub current_page: u32,
    pub total_pages: u64,
    pub has_more: bool,
    /// Reviews across every page
    pub total: u64,
}

impl From<ReviewPage> for ReviewsResponse {
    fn from(page: ReviewPage) -> Self {
        Self {
            success: true,
            current_page: page.page.page(),
            total_pages: page.total_pages(),
            has_more: page.has_more(),
            total: page.total,
            reviews: page.reviews.into_iter().map(Into::into).collect(),
        }
    }
}

/// Product Reviews Handler
///
/// Newest first, `limit` per page (10 by default, at most 50).
#[endpoint(tags("reviews"), summary = "List Product Reviews")]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    page: QueryParam<u32, false>,
    limit: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let page = state
        .app
        .reviews
        .list_reviews(
            product.into_inner().into(),
            PageRequest::new(page.into_inner(), limit.into_inner()),
        )
        .await
        .map_err(into_api_error)?;

    Ok(Json(page.into()))
}
