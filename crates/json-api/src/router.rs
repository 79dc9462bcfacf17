//! App Router

use salvo::Router;

use crate::{auth, carts, orders, payments, products, reviews, users};

/// Every `/api` route.
///
/// Catalog and review reads are public. Everything else needs a bearer token, and the
/// admin group additionally needs the admin role.
pub(crate) fn app_router() -> Router {
    Router::with_path("api")
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("featured").get(products::featured::handler))
                .push(Router::with_path("{product}").get(products::get::handler)),
        )
        .push(
            Router::with_path("reviews")
                .push(Router::with_path("product/{product}").get(reviews::product::handler))
                .push(Router::with_path("stats/{product}").get(reviews::stats::handler)),
        )
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .push(customer_router())
                .push(admin_router()),
        )
}

fn customer_router() -> Router {
    Router::new()
        .push(
            Router::with_path("cart")
                .get(carts::get::handler)
                .push(Router::with_path("clear").delete(carts::clear::handler))
                .push(Router::with_path("add").post(carts::items::create::handler))
                .push(Router::with_path("update/{item}").put(carts::items::update::handler))
                .push(Router::with_path("remove/{item}").delete(carts::items::delete::handler)),
        )
        .push(
            Router::with_path("orders")
                .post(orders::create::handler)
                .push(Router::with_path("myorders").get(orders::mine::handler))
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .delete(orders::delete::handler)
                        .push(Router::with_path("pay").put(orders::pay::handler))
                        .push(Router::with_path("cancel").put(orders::cancel::handler)),
                ),
        )
        .push(
            Router::with_path("payment")
                .push(
                    Router::with_path("create-checkout-session")
                        .post(payments::checkout::handler),
                )
                .push(Router::with_path("verify/{session_id}").get(payments::verify::handler)),
        )
        .push(
            Router::with_path("reviews")
                .post(reviews::create::handler)
                .push(
                    Router::with_path("can-review/{product}").get(reviews::eligibility::handler),
                )
                .push(
                    Router::with_path("{review}")
                        .put(reviews::update::handler)
                        .delete(reviews::delete::handler),
                ),
        )
        .push(Router::with_path("users/me").get(users::me::handler))
}

fn admin_router() -> Router {
    Router::new()
        .hoop(auth::middleware::admin)
        .push(
            Router::with_path("products")
                .post(products::create::handler)
                .push(
                    Router::with_path("{product}")
                        .put(products::update::handler)
                        .delete(products::delete::handler),
                ),
        )
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .push(Router::with_path("{order}/status").put(orders::status::handler)),
        )
        .push(
            Router::with_path("users")
                .get(users::index::handler)
                .push(Router::with_path("{user}/role").put(users::role::handler)),
        )
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        http::header::AUTHORIZATION,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::{
        auth::MockAuthService,
        domain::{
            orders::{MockOrdersService, records::OrderUuid},
            products::MockProductsService,
            reviews::{MockReviewsService, data::ReviewStats},
            users::records::UserRecord,
        },
    };

    use crate::{
        errors::ErrorResponse,
        orders::{OrdersEnvelope, tests::make_order},
        test_helpers::{Mocks, admin_user, customer_user},
    };

    use super::*;

    fn authenticating_as(user: UserRecord) -> MockAuthService {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .return_once(move |_| Ok(user));

        auth
    }

    fn make_service(mocks: Mocks) -> Service {
        Service::new(Router::new().hoop(inject(mocks.into_state())).push(app_router()))
    }

    #[tokio::test]
    async fn test_catalog_is_public() -> TestResult {
        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .once()
            .return_once(|_| Ok(Vec::new()));

        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com/api/products")
            .send(&make_service(Mocks {
                products,
                auth,
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_review_stats_are_public_but_writing_needs_a_token() -> TestResult {
        let mut reviews = MockReviewsService::new();

        reviews
            .expect_review_stats()
            .once()
            .return_once(|_| Ok(ReviewStats::default()));

        reviews.expect_create_review().never();

        let service = make_service(Mocks {
            reviews,
            ..Mocks::default()
        });

        let res = TestClient::get(format!(
            "http://example.com/api/reviews/stats/{}",
            uuid::Uuid::now_v7()
        ))
        .send(&service)
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let res = TestClient::post("http://example.com/api/reviews")
            .json(&json!({ "productId": uuid::Uuid::now_v7(), "rating": 5, "comment": "Great" }))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_cart_requires_a_token() -> TestResult {
        let mut res = TestClient::get("http://example.com/api/cart")
            .send(&make_service(Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        let body: ErrorResponse = res.take_json().await?;

        assert_eq!(body.message, "Not authorized, no token");

        Ok(())
    }

    #[tokio::test]
    async fn test_customers_cannot_create_products() -> TestResult {
        let mut products = MockProductsService::new();

        products.expect_create_product().never();

        let res = TestClient::post("http://example.com/api/products")
            .add_header(AUTHORIZATION, "Bearer customer-token", true)
            .json(&json!({ "name": "Poster", "category": "posters", "price": 1_000 }))
            .send(&make_service(Mocks {
                products,
                auth: authenticating_as(customer_user()),
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_my_orders_is_not_treated_as_an_order_id() -> TestResult {
        let user = customer_user();
        let owner = user.uuid;

        let mut orders = MockOrdersService::new();

        orders
            .expect_list_orders_for_user()
            .once()
            .withf(move |u| *u == owner)
            .return_once(|u| Ok(vec![make_order(OrderUuid::new(), u)]));

        orders.expect_get_order().never();

        let response: OrdersEnvelope = TestClient::get("http://example.com/api/orders/myorders")
            .add_header(AUTHORIZATION, "Bearer customer-token", true)
            .send(&make_service(Mocks {
                orders,
                auth: authenticating_as(user),
                ..Mocks::default()
            }))
            .await
            .take_json()
            .await?;

        assert_eq!(response.count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_admins_can_list_every_order() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_list_orders()
            .once()
            .return_once(|| Ok(Vec::new()));

        let res = TestClient::get("http://example.com/api/orders")
            .add_header(AUTHORIZATION, "Bearer admin-token", true)
            .send(&make_service(Mocks {
                orders,
                auth: authenticating_as(admin_user()),
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_customers_cannot_list_every_order() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_list_orders().never();

        let res = TestClient::get("http://example.com/api/orders")
            .add_header(AUTHORIZATION, "Bearer customer-token", true)
            .send(&make_service(Mocks {
                orders,
                auth: authenticating_as(customer_user()),
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
