//! Update Review Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use storefront_app::domain::reviews::data::ReviewUpdate;

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::{ReviewContent, ReviewEnvelope, errors::into_api_error},
    state::State,
};

/// Update Review Handler
///
/// Authors only. Replaces the rating and comment.
#[endpoint(tags("reviews"), summary = "Update Review", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    json: JsonBody<ReviewContent>,
    depot: &mut Depot,
) -> Result<Json<ReviewEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let content = json.into_inner();

    let review = state
        .app
        .reviews
        .update_review(
            user.uuid,
            review.into_inner().into(),
            ReviewUpdate {
                rating: content.rating,
                comment: content.comment,
            },
        )
        .await
        .map_err(into_api_error)?;

    Ok(Json(ReviewEnvelope::new(
        review,
        "Review updated successfully!",
    )))
}
