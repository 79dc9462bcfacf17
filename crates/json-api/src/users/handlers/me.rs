//! Current User Handler

use salvo::prelude::*;

use crate::{errors::ApiError, extensions::*, users::UserEnvelope};

/// Current User Handler
///
/// The authenticated caller, as resolved from the bearer token.
#[endpoint(tags("users"), summary = "Get Current User", security(("bearer_auth" = [])))]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<UserEnvelope>, ApiError> {
    let user = depot.current_user_or_401()?;

    Ok(Json(user.clone().into()))
}
