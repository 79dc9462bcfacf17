//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{CartEnvelope, errors::into_api_error},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Get Cart Handler
///
/// Returns the caller's cart, creating an empty one on first use.
#[endpoint(tags("cart"), summary = "Get Cart", security(("bearer_auth" = [])))]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let cart = state
        .app
        .carts
        .get_cart(user.uuid)
        .await
        .map_err(into_api_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{carts::MockCartsService, products::records::ProductUuid};

    use crate::{
        carts::tests::{make_cart, make_item},
        test_helpers::{Mocks, customer_user},
    };

    use super::*;

    #[tokio::test]
    async fn test_get_cart_returns_items_and_subtotal() -> TestResult {
        let user = customer_user();
        let owner = user.uuid;

        let mut carts = MockCartsService::new();

        carts
            .expect_get_cart()
            .once()
            .withf(move |u| *u == owner)
            .return_once(move |u| {
                Ok(make_cart(
                    u,
                    vec![
                        make_item(ProductUuid::new(), 2, 1_200),
                        make_item(ProductUuid::new(), 1, 2_400),
                    ],
                ))
            });

        let service = Mocks {
            carts,
            ..Mocks::default()
        }
        .service_as(&user, Router::with_path("cart").get(handler));

        let response: CartEnvelope = TestClient::get("http://example.com/cart")
            .send(&service)
            .await
            .take_json()
            .await?;

        assert!(response.success);
        assert_eq!(response.cart.items.len(), 2);
        assert_eq!(response.cart.items[0].line_total, 2_400);
        assert_eq!(response.cart.subtotal, 4_800);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cart_without_user_returns_401() -> TestResult {
        let service = Mocks::default().public_service(Router::with_path("cart").get(handler));

        let res = TestClient::get("http://example.com/cart").send(&service).await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
