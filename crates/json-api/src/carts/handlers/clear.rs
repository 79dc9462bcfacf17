//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{CartEnvelope, errors::into_api_error},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Clear Cart Handler
#[endpoint(tags("cart"), summary = "Clear Cart", security(("bearer_auth" = [])))]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let cart = state
        .app
        .carts
        .clear_cart(user.uuid)
        .await
        .map_err(into_api_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::carts::MockCartsService;

    use crate::{
        carts::tests::make_cart,
        test_helpers::{Mocks, customer_user},
    };

    use super::*;

    #[tokio::test]
    async fn test_clear_cart_returns_empty_cart() -> TestResult {
        let user = customer_user();
        let owner = user.uuid;

        let mut carts = MockCartsService::new();

        carts
            .expect_clear_cart()
            .once()
            .withf(move |u| *u == owner)
            .return_once(|u| Ok(make_cart(u, Vec::new())));

        let service = Mocks {
            carts,
            ..Mocks::default()
        }
        .service_as(&user, Router::with_path("cart/clear").delete(handler));

        let response: CartEnvelope = TestClient::delete("http://example.com/cart/clear")
            .send(&service)
            .await
            .take_json()
            .await?;

        assert!(response.cart.items.is_empty());
        assert_eq!(response.cart.subtotal, 0);

        Ok(())
    }
}
