//! Cancel Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    errors::ApiError,
    extensions::*,
    orders::{OrderEnvelope, errors::into_api_error},
    state::State,
};

/// Cancel Order Handler
///
/// Only pending and processing orders can be cancelled. Their stock is returned.
#[endpoint(tags("orders"), summary = "Cancel Order", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let order = state
        .app
        .orders
        .cancel_order(user.actor(), order.into_inner().into())
        .await
        .map_err(into_api_error)?;

    tracing::info!(order_uuid = %order.uuid, user_uuid = %user.uuid, "cancelled order");

    Ok(Json(OrderEnvelope::with_message(
        order,
        "Order cancelled successfully",
    )))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::orders::{
        MockOrdersService, OrdersServiceError, records::OrderUuid, status::OrderStatus,
    };

    use crate::{
        errors::ErrorResponse,
        orders::tests::make_order,
        test_helpers::{Mocks, customer_user},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        Mocks {
            orders,
            ..Mocks::default()
        }
        .service_as(
            &customer_user(),
            Router::with_path("orders/{order}/cancel").put(handler),
        )
    }

    #[tokio::test]
    async fn test_cancel_order_success() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_cancel_order()
            .once()
            .withf(move |_, order| *order == uuid)
            .return_once(|actor, order| {
                let mut cancelled = make_order(order, actor.uuid);

                cancelled.status = OrderStatus::Cancelled;

                Ok(cancelled)
            });

        let response: OrderEnvelope =
            TestClient::put(format!("http://example.com/orders/{uuid}/cancel"))
                .send(&make_service(orders))
                .await
                .take_json()
                .await?;

        assert_eq!(response.order.status, "cancelled");
        assert_eq!(
            response.message.as_deref(),
            Some("Order cancelled successfully")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_shipped_order_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_cancel_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::NotCancellable(OrderStatus::Shipped)));

        let mut res = TestClient::put(format!(
            "http://example.com/orders/{}/cancel",
            OrderUuid::new()
        ))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: ErrorResponse = res.take_json().await?;

        assert_eq!(body.message, "Cannot cancel an order that is shipped");

        Ok(())
    }
}
