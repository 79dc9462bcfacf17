//! Review Eligibility Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::reviews::data::ReviewEligibility;

use crate::{
    errors::ApiError,
    extensions::*,
    reviews::errors::into_api_error,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewEligibilityResponse {
    pub success: bool,
    pub can_review: bool,
    /// A review would be marked as a verified purchase
    pub has_purchased: bool,
    pub existing_review: Option<Uuid>,
    pub message: String,
}

impl From<ReviewEligibility> for ReviewEligibilityResponse {
    fn from(eligibility: ReviewEligibility) -> Self {
        let message = match (eligibility.can_review(), eligibility.has_purchased) {
            (false, _) => "You have already reviewed this product",
            (true, true) => "You can review this product",
            (true, false) => "Review allowed (not verified purchase)",
        };

        Self {
            success: true,
            can_review: eligibility.can_review(),
            has_purchased: eligibility.has_purchased,
            existing_review: eligibility.existing_review.map(Into::into),
            message: message.to_string(),
        }
    }
}

/// Review Eligibility Handler
#[endpoint(
    tags("reviews"),
    summary = "Review Eligibility",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReviewEligibilityResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let eligibility = state
        .app
        .reviews
        .review_eligibility(user.uuid, product.into_inner().into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(eligibility.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        products::records::ProductUuid,
        reviews::{MockReviewsService, records::ReviewUuid},
    };

    use crate::test_helpers::{Mocks, customer_user};

    use super::*;

    fn make_service(reviews: MockReviewsService) -> Service {
        Mocks {
            reviews,
            ..Mocks::default()
        }
        .service_as(
            &customer_user(),
            Router::with_path("reviews/can-review/{product}").get(handler),
        )
    }

    #[tokio::test]
    async fn test_buyer_without_review_may_review() -> TestResult {
        let mut reviews = MockReviewsService::new();

        reviews.expect_review_eligibility().once().return_once(|_, _| {
            Ok(ReviewEligibility {
                existing_review: None,
                has_purchased: true,
            })
        });

        let response: ReviewEligibilityResponse = TestClient::get(format!(
            "http://example.com/reviews/can-review/{}",
            ProductUuid::new()
        ))
        .send(&make_service(reviews))
        .await
        .take_json()
        .await?;

        assert!(response.can_review);
        assert!(response.has_purchased);
        assert_eq!(response.message, "You can review this product");

        Ok(())
    }

    #[tokio::test]
    async fn test_existing_review_blocks_another() -> TestResult {
        let existing = ReviewUuid::new();

        let mut reviews = MockReviewsService::new();

        reviews.expect_review_eligibility().once().return_once(move |_, _| {
            Ok(ReviewEligibility {
                existing_review: Some(existing),
                has_purchased: false,
            })
        });

        let response: ReviewEligibilityResponse = TestClient::get(format!(
            "http://example.com/reviews/can-review/{}",
            ProductUuid::new()
        ))
        .send(&make_service(reviews))
        .await
        .take_json()
        .await?;

        assert!(!response.can_review);
        assert_eq!(response.existing_review, Some(existing.into_uuid()));

        Ok(())
    }
}
