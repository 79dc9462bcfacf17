//! Product Errors

use tracing::error;

use storefront_app::domain::products::ProductsServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: ProductsServiceError) -> ApiError {
    match error {
        ProductsServiceError::AlreadyExists => ApiError::conflict("Product already exists"),
        ProductsServiceError::NotFound => ApiError::not_found("Product not found"),
        ProductsServiceError::InvalidDiscount => {
            ApiError::bad_request("Discount price must be below the price")
        }
        ProductsServiceError::UnknownSize(size) => {
            ApiError::bad_request(format!("Unknown size: {size}"))
        }
        ProductsServiceError::InvalidReference
        | ProductsServiceError::MissingRequiredData
        | ProductsServiceError::InvalidData => ApiError::bad_request("Invalid product payload"),
        ProductsServiceError::Sql(source) => {
            error!("failed to access products: {source}");

            ApiError::internal("Server error").with_detail(source)
        }
    }
}
