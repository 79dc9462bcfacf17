//! Auth service errors.

use sqlx::Error;
use thiserror::Error;

use crate::auth::TokenError;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("invalid token")]
    InvalidToken(#[source] TokenError),

    #[error("user not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AuthServiceError {
    fn from(error: Error) -> Self {
        match error {
            Error::RowNotFound => Self::NotFound,
            error => Self::Sql(error),
        }
    }
}

impl From<TokenError> for AuthServiceError {
    fn from(error: TokenError) -> Self {
        Self::InvalidToken(error)
    }
}
