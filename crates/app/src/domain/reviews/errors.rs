//! Reviews service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::reviews::data::MAX_COMMENT_CHARS;

#[derive(Debug, Error)]
pub enum ReviewsServiceError {
    #[error("product already reviewed by this user")]
    AlreadyReviewed,

    #[error("review not found")]
    NotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("rating must be between 1 and 5")]
    InvalidRating,

    #[error("comment must be at most {MAX_COMMENT_CHARS} characters")]
    CommentTooLong,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ReviewsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyReviewed,
            Some(ErrorKind::ForeignKeyViolation) => Self::ProductNotFound,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
