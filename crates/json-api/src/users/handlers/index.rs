//! User Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    users::{UserResponse, errors::into_api_error},
};

/// User List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UsersResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<UserResponse>,
}

/// User Index Handler
#[endpoint(tags("users"), summary = "List Users", security(("bearer_auth" = [])))]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<UsersResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let users = state
        .app
        .users
        .list_users()
        .await
        .map_err(into_api_error)?;

    Ok(Json(UsersResponse {
        success: true,
        count: users.len(),
        users: users.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::users::MockUsersService;

    use crate::test_helpers::{Mocks, admin_user, customer_user};

    use super::*;

    #[tokio::test]
    async fn test_list_users() -> TestResult {
        let mut users = MockUsersService::new();

        users
            .expect_list_users()
            .once()
            .return_once(|| Ok(vec![admin_user(), customer_user()]));

        let service = Mocks {
            users,
            ..Mocks::default()
        }
        .service_as(&admin_user(), Router::with_path("users").get(handler));

        let response: UsersResponse = TestClient::get("http://example.com/users")
            .send(&service)
            .await
            .take_json()
            .await?;

        assert_eq!(response.count, 2);
        assert!(response.users[0].is_admin);
        assert!(!response.users[1].is_admin);

        Ok(())
    }
}
