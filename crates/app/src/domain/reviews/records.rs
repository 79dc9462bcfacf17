//! Review Records

use jiff::Timestamp;

use crate::{
    domain::{products::records::ProductUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Review UUID
pub type ReviewUuid = TypedUuid<ReviewRecord>;

/// Review Record
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub uuid: ReviewUuid,
    pub product_uuid: ProductUuid,
    pub user_uuid: UserUuid,
    /// Name of the reviewing user at read time
    pub author_name: String,
    /// One to five stars
    pub rating: u8,
    pub comment: String,
    /// The author had a delivered order containing the product when reviewing
    pub is_verified_purchase: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
