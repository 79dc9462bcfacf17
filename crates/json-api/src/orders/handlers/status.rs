//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::{data::StatusUpdate, status::OrderStatus};

use crate::{
    errors::ApiError,
    extensions::*,
    orders::{OrderEnvelope, errors::into_api_error},
    state::State,
};

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateStatusRequest {
    /// pending, processing, shipped, delivered or cancelled
    #[serde(alias = "orderStatus")]
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

impl UpdateStatusRequest {
    fn into_update(self) -> Result<StatusUpdate, ApiError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|error| ApiError::bad_request("Invalid order status").with_detail(error))?;

        Ok(StatusUpdate {
            status,
            tracking_number: self.tracking_number,
        })
    }
}

/// Update Order Status Handler
///
/// Admin only. Moving to `cancelled` returns the order's stock.
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(
    name = "orders.update_status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, status = tracing::field::Empty),
    err(Debug)
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let order = order.into_inner();
    let update = json.into_inner().into_update()?;

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("status", update.status.as_str());

    let updated = state
        .app
        .orders
        .update_status(order.into(), update)
        .await
        .map_err(into_api_error)?;

    tracing::info!(order_uuid = %order, status = %updated.status, "updated order status");

    Ok(Json(OrderEnvelope::with_message(
        updated,
        "Order status updated successfully",
    )))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::orders::{
        MockOrdersService, OrdersServiceError, records::OrderUuid,
    };

    use crate::{
        orders::tests::make_order,
        test_helpers::{Mocks, admin_user},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        Mocks {
            orders,
            ..Mocks::default()
        }
        .service_as(
            &admin_user(),
            Router::with_path("orders/{order}/status").put(handler),
        )
    }

    #[tokio::test]
    async fn test_update_status_to_shipped_with_tracking() -> TestResult {
        let uuid = OrderUuid::new();
        let owner = admin_user().uuid;

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_status()
            .once()
            .withf(move |order, update| {
                *order == uuid
                    && *update
                        == StatusUpdate {
                            status: OrderStatus::Shipped,
                            tracking_number: Some("TRK-1".to_string()),
                        }
            })
            .return_once(move |order, update| {
                let mut shipped = make_order(order, owner);

                shipped.status = update.status;
                shipped.tracking_number = update.tracking_number;

                Ok(shipped)
            });

        let response: OrderEnvelope =
            TestClient::put(format!("http://example.com/orders/{uuid}/status"))
                .json(&json!({ "status": "Shipped", "trackingNumber": "TRK-1" }))
                .send(&make_service(orders))
                .await
                .take_json()
                .await?;

        assert_eq!(response.order.status, "shipped");
        assert_eq!(response.order.tracking_number.as_deref(), Some("TRK-1"));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_accepts_order_status_field() -> TestResult {
        let uuid = OrderUuid::new();
        let owner = admin_user().uuid;

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_status()
            .once()
            .withf(|_, update| update.status == OrderStatus::Delivered)
            .return_once(move |order, update| {
                let mut delivered = make_order(order, owner);

                delivered.status = update.status;

                Ok(delivered)
            });

        let response: OrderEnvelope =
            TestClient::put(format!("http://example.com/orders/{uuid}/status"))
                .json(&json!({ "orderStatus": "delivered" }))
                .send(&make_service(orders))
                .await
                .take_json()
                .await?;

        assert_eq!(response.order.status, "delivered");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_unknown_status_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_update_status().never();

        let res = TestClient::put(format!(
            "http://example.com/orders/{}/status",
            OrderUuid::new()
        ))
        .json(&json!({ "status": "refunded" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_backwards_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_update_status().once().return_once(|_, _| {
            Err(OrdersServiceError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending,
            })
        });

        let res = TestClient::put(format!(
            "http://example.com/orders/{}/status",
            OrderUuid::new()
        ))
        .json(&json!({ "status": "pending" }))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
