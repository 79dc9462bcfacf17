//! Errors

use tracing::error;

use storefront_app::domain::carts::CartsServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: CartsServiceError) -> ApiError {
    match error {
        CartsServiceError::AlreadyExists => ApiError::conflict("Cart item already exists"),
        CartsServiceError::NotFound => ApiError::not_found("Cart item not found"),
        CartsServiceError::ProductNotFound => ApiError::not_found("Product not found"),
        CartsServiceError::InvalidQuantity => {
            ApiError::bad_request("Quantity must be at least one")
        }
        CartsServiceError::InsufficientStock { available } => {
            ApiError::bad_request(format!("Only {available} left in stock"))
        }
        CartsServiceError::InvalidReference
        | CartsServiceError::MissingRequiredData
        | CartsServiceError::InvalidData => ApiError::bad_request("Invalid cart payload"),
        CartsServiceError::Sql(source) => {
            error!("failed to access cart: {source}");

            ApiError::internal("Server error").with_detail(source)
        }
    }
}
