//! Payment Errors

use tracing::{error, warn};

use storefront_app::domain::payments::PaymentsServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: PaymentsServiceError) -> ApiError {
    match error {
        PaymentsServiceError::EmptyCart => ApiError::bad_request("No items in cart"),
        PaymentsServiceError::MissingShippingAddress => {
            ApiError::bad_request("Shipping information is required")
        }
        PaymentsServiceError::InvalidQuantity => {
            ApiError::bad_request("Quantity must be at least one")
        }
        PaymentsServiceError::ProductNotFound(product) => {
            ApiError::not_found("Product not found").with_detail(product)
        }
        PaymentsServiceError::OrderNotFound => ApiError::not_found("Order not found"),
        PaymentsServiceError::OrderAlreadyPaid => ApiError::bad_request("Order is already paid"),
        PaymentsServiceError::Forbidden => {
            ApiError::forbidden("Not authorized to access this payment")
        }
        PaymentsServiceError::InvalidPrice(message) => {
            ApiError::bad_request("Invalid price").with_detail(message)
        }
        PaymentsServiceError::GatewayConfiguration => {
            error!("payment processor rejected the configured credentials");

            ApiError::internal("Payment gateway configuration error")
        }
        PaymentsServiceError::Gateway(source) => {
            warn!("payment processor request failed: {source}");

            ApiError::bad_gateway("Payment gateway unavailable").with_detail(source)
        }
        PaymentsServiceError::SessionNotFound => ApiError::not_found("Payment session not found"),
        PaymentsServiceError::PaymentIncomplete { status } => {
            ApiError::bad_request(format!("Payment incomplete: {status}"))
        }
        PaymentsServiceError::OrderNotPayable(status) => {
            ApiError::bad_request(format!("Cannot pay for an order that is {status}"))
        }
        PaymentsServiceError::AmountMismatch { expected, charged } => {
            error!(expected, ?charged, "charged amount differs from the order total");

            ApiError::conflict("Payment amount does not match order total")
        }
        PaymentsServiceError::AlreadyExists => ApiError::conflict("Payment already recorded"),
        PaymentsServiceError::NotFound => ApiError::not_found("Not found"),
        PaymentsServiceError::InvalidReference
        | PaymentsServiceError::MissingRequiredData
        | PaymentsServiceError::InvalidData => ApiError::bad_request("Invalid payment data"),
        PaymentsServiceError::Sql(source) => {
            error!("failed to reconcile payment: {source}");

            ApiError::internal("Server error").with_detail(source)
        }
    }
}
