//! Review Errors

use tracing::error;

use storefront_app::domain::reviews::{ReviewsServiceError, data::MAX_COMMENT_CHARS};

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: ReviewsServiceError) -> ApiError {
    match error {
        ReviewsServiceError::AlreadyReviewed => {
            ApiError::bad_request("You have already reviewed this product")
        }
        ReviewsServiceError::NotFound => ApiError::not_found("Review not found"),
        ReviewsServiceError::ProductNotFound => ApiError::not_found("Product not found"),
        ReviewsServiceError::InvalidRating => {
            ApiError::bad_request("Rating must be between 1 and 5")
        }
        ReviewsServiceError::CommentTooLong => ApiError::bad_request(format!(
            "Comment cannot exceed {MAX_COMMENT_CHARS} characters"
        )),
        ReviewsServiceError::MissingRequiredData | ReviewsServiceError::InvalidData => {
            ApiError::bad_request("Invalid review payload")
        }
        ReviewsServiceError::Sql(source) => {
            error!("failed to access reviews: {source}");

            ApiError::internal("Server error").with_detail(source)
        }
    }
}
