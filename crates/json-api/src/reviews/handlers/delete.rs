//! Delete Review Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError, extensions::*, responses::MessageResponse, reviews::errors::into_api_error,
    state::State,
};

/// Delete Review Handler
///
/// Authors delete their own reviews; admins may delete any.
#[endpoint(tags("reviews"), summary = "Delete Review", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    review: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let review = review.into_inner();

    state
        .app
        .reviews
        .delete_review(user.actor(), review.into())
        .await
        .map_err(into_api_error)?;

    tracing::info!(review_uuid = %review, user_uuid = %user.uuid, "deleted review");

    Ok(Json(MessageResponse::new("Review deleted successfully")))
}
