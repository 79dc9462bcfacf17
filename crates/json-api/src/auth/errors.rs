//! Auth Errors

use tracing::error;

use storefront_app::auth::{AuthServiceError, TokenError};

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: AuthServiceError) -> ApiError {
    match error {
        AuthServiceError::InvalidToken(TokenError::Expired) => {
            ApiError::unauthorized("Not authorized, token expired")
        }
        AuthServiceError::InvalidToken(source) => {
            ApiError::unauthorized("Not authorized, token failed").with_detail(source)
        }
        AuthServiceError::NotFound => ApiError::unauthorized("User not found"),
        AuthServiceError::Sql(source) => {
            error!("failed to authenticate bearer token: {source}");

            ApiError::internal("Server error").with_detail(source)
        }
    }
}
