//! Review Stats Handler

use std::{collections::BTreeMap, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::reviews::data::ReviewStats;

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::errors::into_api_error,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewStatsResponse {
    pub success: bool,
    /// Average rating to one decimal place, 0 without reviews
    pub average_rating: f64,
    pub total_reviews: u32,
    /// Review count keyed by star rating, "1" to "5"
    pub rating_distribution: BTreeMap<String, u32>,
}

impl From<ReviewStats> for ReviewStatsResponse {
    fn from(stats: ReviewStats) -> Self {
        Self {
            success: true,
            average_rating: f64::from(stats.rating_tenths) / 10.0,
            total_reviews: stats.total_reviews,
            rating_distribution: (1..=5)
                .map(|stars: u8| (stars.to_string(), stats.count_for(stars)))
                .collect(),
        }
    }
}

/// Review Stats Handler
#[endpoint(tags("reviews"), summary = "Review Stats")]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReviewStatsResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let stats = state
        .app
        .reviews
        .review_stats(product.into_inner().into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(stats.into()))
}
