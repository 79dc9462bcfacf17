//! Order Errors

use tracing::error;

use storefront_app::domain::orders::OrdersServiceError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: OrdersServiceError) -> ApiError {
    match error {
        OrdersServiceError::AlreadyExists => ApiError::conflict("Order already exists"),
        OrdersServiceError::NotFound => ApiError::not_found("Order not found"),
        OrdersServiceError::ProductNotFound(product) => {
            ApiError::not_found("Product not found").with_detail(product)
        }
        OrdersServiceError::EmptyOrder => ApiError::bad_request("No order items"),
        OrdersServiceError::MissingShippingAddress => {
            ApiError::bad_request("Shipping address is required")
        }
        OrdersServiceError::InvalidQuantity => {
            ApiError::bad_request("Quantity must be at least one")
        }
        OrdersServiceError::InsufficientStock {
            name, available, ..
        } => ApiError::bad_request(format!(
            "Insufficient stock for {name}. Only {available} left"
        )),
        OrdersServiceError::Forbidden => {
            ApiError::forbidden("Not authorized to access this order")
        }
        OrdersServiceError::NotCancellable(status) => {
            ApiError::bad_request(format!("Cannot cancel an order that is {status}"))
        }
        OrdersServiceError::NotPayable(status) => {
            ApiError::bad_request(format!("Cannot pay for an order that is {status}"))
        }
        OrdersServiceError::NotDeletable(status) => {
            ApiError::bad_request(format!("Cannot delete an order that is {status}"))
        }
        OrdersServiceError::InvalidTransition { from, to } => {
            ApiError::bad_request(format!("Cannot change order status from {from} to {to}"))
        }
        OrdersServiceError::PaymentReferenceInUse => {
            ApiError::conflict("Payment already recorded for another order")
        }
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => ApiError::bad_request("Invalid order payload"),
        OrdersServiceError::Sql(source) => {
            error!("failed to access orders: {source}");

            ApiError::internal("Server error").with_detail(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use storefront_app::domain::{orders::status::OrderStatus, products::records::ProductUuid};

    use super::*;

    #[test]
    fn stock_shortfall_names_the_product() {
        let error = into_api_error(OrdersServiceError::InsufficientStock {
            product: ProductUuid::new(),
            name: "Luffy Figure".to_string(),
            available: 1,
            requested: 3,
        });

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "Insufficient stock for Luffy Figure. Only 1 left");
    }

    #[test]
    fn lifecycle_violations_are_bad_requests() {
        for error in [
            OrdersServiceError::NotCancellable(OrderStatus::Shipped),
            OrdersServiceError::NotPayable(OrderStatus::Cancelled),
            OrdersServiceError::NotDeletable(OrderStatus::Delivered),
            OrdersServiceError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending,
            },
        ] {
            assert_eq!(into_api_error(error).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn reused_payment_reference_is_a_conflict() {
        let error = into_api_error(OrdersServiceError::PaymentReferenceInUse);

        assert_eq!(error.status(), StatusCode::CONFLICT);
    }
}
