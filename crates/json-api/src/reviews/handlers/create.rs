//! Create Review Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::reviews::{data::NewReview, records::ReviewUuid};

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::{ReviewContent, ReviewEnvelope, errors::into_api_error},
    state::State,
};

/// Create Review Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateReviewRequest {
    #[serde(alias = "product", alias = "productId")]
    pub product_uuid: Uuid,
    #[serde(flatten)]
    pub content: ReviewContent,
}

/// Create Review Handler
///
/// One review per user and product. Marked as a verified purchase when the
/// user has a delivered order containing the product.
#[endpoint(
    tags("reviews"),
    summary = "Create Review",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Review created"),
    ),
)]
#[tracing::instrument(
    name = "reviews.create",
    skip(json, depot, res),
    fields(product_uuid = tracing::field::Empty),
    err(Debug)
)]
pub(crate) async fn handler(
    json: JsonBody<CreateReviewRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReviewEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;
    let request = json.into_inner();

    tracing::Span::current().record(
        "product_uuid",
        tracing::field::display(request.product_uuid),
    );

    let review = state
        .app
        .reviews
        .create_review(
            user.uuid,
            NewReview {
                uuid: ReviewUuid::new(),
                product_uuid: request.product_uuid.into(),
                rating: request.content.rating,
                comment: request.content.comment,
            },
        )
        .await
        .map_err(into_api_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(ReviewEnvelope::new(
        review,
        "Review submitted successfully!",
    )))
}
