//! Auth middleware.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};

use storefront_app::domain::users::records::Role;

use crate::{auth::errors::into_api_error, errors::ApiError, extensions::*, state::State};

/// Resolve the bearer token to a user and store it in the depot.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(token) = extract_bearer_token(req) else {
        res.render(ApiError::unauthorized("Not authorized, no token"));
        ctrl.skip_rest();

        return;
    };

    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => Arc::clone(state),
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    match state.app.auth.authenticate_bearer(token).await {
        Ok(user) => {
            tracing::debug!(user_uuid = %user.uuid, role = %user.role, "authenticated request");

            depot.insert_current_user(user);
        }
        Err(error) => {
            res.render(into_api_error(error));
            ctrl.skip_rest();

            return;
        }
    }

    ctrl.call_next(req, depot, res).await;
}

/// Only let admins through. Must run after [`handler`].
#[salvo::handler]
pub(crate) async fn admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let role = match depot.current_user_or_401() {
        Ok(user) => user.role,
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    if role != Role::Admin {
        res.render(ApiError::forbidden("Not authorized as an admin"));
        ctrl.skip_rest();

        return;
    }

    ctrl.call_next(req, depot, res).await;
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
