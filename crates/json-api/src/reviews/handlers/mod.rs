//! Review Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::reviews::records::ReviewRecord;

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod eligibility;
pub(crate) mod product;
pub(crate) mod stats;
pub(crate) mod update;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub user_uuid: Uuid,
    pub author_name: String,
    /// One to five stars
    pub rating: u8,
    pub comment: String,
    pub is_verified_purchase: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ReviewRecord> for ReviewResponse {
    fn from(review: ReviewRecord) -> Self {
        Self {
            uuid: review.uuid.into(),
            product_uuid: review.product_uuid.into(),
            user_uuid: review.user_uuid.into(),
            author_name: review.author_name,
            rating: review.rating,
            comment: review.comment,
            is_verified_purchase: review.is_verified_purchase,
            created_at: review.created_at.to_string(),
            updated_at: review.updated_at.to_string(),
        }
    }
}

/// Single Review Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewEnvelope {
    pub success: bool,
    pub message: String,
    pub review: ReviewResponse,
}

impl ReviewEnvelope {
    pub(super) fn new(review: ReviewRecord, message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            review: review.into(),
        }
    }
}

/// Rating and comment, as sent when writing a review.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewContent {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}
