//! Set User Role Handler

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

use storefront_app::domain::users::records::Role;

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    users::{UserEnvelope, errors::into_api_error},
};

/// Set Role Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SetRoleRequest {
    /// customer or admin
    pub role: String,
}

/// Set User Role Handler
#[endpoint(tags("users"), summary = "Set User Role", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    user: PathParam<Uuid>,
    json: JsonBody<SetRoleRequest>,
    depot: &mut Depot,
) -> Result<Json<UserEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = user.into_inner();

    let role = json
        .into_inner()
        .role
        .parse::<Role>()
        .map_err(|error| ApiError::bad_request("Invalid role").with_detail(error))?;

    let updated = state
        .app
        .users
        .set_role(user.into(), role)
        .await
        .map_err(into_api_error)?;

    tracing::info!(user_uuid = %user, role = %updated.role, "changed user role");

    Ok(Json(updated.into()))
}
