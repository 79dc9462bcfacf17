//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    carts::{CartEnvelope, errors::into_api_error},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Remove Cart Item Handler
#[endpoint(tags("cart"), summary = "Remove Cart Item", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CartEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.current_user_or_401()?;

    let cart = state
        .app
        .carts
        .remove_item(user.uuid, item.into_inner().into())
        .await
        .map_err(into_api_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::carts::{
        CartsServiceError, MockCartsService, records::CartItemUuid,
    };

    use crate::{
        carts::tests::make_cart,
        test_helpers::{Mocks, customer_user},
    };

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        Mocks {
            carts,
            ..Mocks::default()
        }
        .service_as(
            &customer_user(),
            Router::with_path("cart/remove/{item}").delete(handler),
        )
    }

    #[tokio::test]
    async fn test_remove_item_success() -> TestResult {
        let item = CartItemUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_remove_item()
            .once()
            .withf(move |_, uuid| *uuid == item)
            .return_once(|user, _| Ok(make_cart(user, Vec::new())));

        let mut res = TestClient::delete(format!("http://example.com/cart/remove/{item}"))
            .send(&make_service(carts))
            .await;

        let body: CartEnvelope = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.cart.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_missing_item_returns_404() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_remove_item()
            .once()
            .return_once(|_, _| Err(CartsServiceError::NotFound));

        let res = TestClient::delete(format!(
            "http://example.com/cart/remove/{}",
            CartItemUuid::new()
        ))
        .send(&make_service(carts))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
