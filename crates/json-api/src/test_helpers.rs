//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};

use storefront_app::{
    auth::MockAuthService,
    context::AppContext,
    domain::{
        carts::MockCartsService,
        orders::MockOrdersService,
        payments::MockPaymentsService,
        products::MockProductsService,
        reviews::MockReviewsService,
        users::{
            MockUsersService,
            records::{Role, UserRecord, UserUuid},
        },
    },
};

use crate::{errors, extensions::*, state::State};

/// One mock per service. Any call without a matching expectation fails the test.
#[derive(Default)]
pub(crate) struct Mocks {
    pub products: MockProductsService,
    pub carts: MockCartsService,
    pub orders: MockOrdersService,
    pub payments: MockPaymentsService,
    pub reviews: MockReviewsService,
    pub users: MockUsersService,
    pub auth: MockAuthService,

    /// Render errors as production would, without their detail.
    pub redact_error_details: bool,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::new(
            AppContext {
                products: Arc::new(self.products),
                carts: Arc::new(self.carts),
                orders: Arc::new(self.orders),
                payments: Arc::new(self.payments),
                reviews: Arc::new(self.reviews),
                users: Arc::new(self.users),
                auth: Arc::new(self.auth),
            },
            !self.redact_error_details,
        )
    }

    /// Serve `route` as if `user` had already authenticated.
    pub(crate) fn service_as(self, user: &UserRecord, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(errors::detail_policy)
                .hoop(InjectUser { user: user.clone() })
                .push(route),
        )
    }

    /// Serve `route` without an authenticated user.
    pub(crate) fn public_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(errors::detail_policy)
                .push(route),
        )
    }
}

struct InjectUser {
    user: UserRecord,
}

#[handler]
impl InjectUser {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_current_user(self.user.clone());
        ctrl.call_next(req, depot, res).await;
    }
}

fn user(role: Role) -> UserRecord {
    let uuid = UserUuid::new();

    UserRecord {
        uuid,
        email: format!("{uuid}@example.com"),
        name: "Monkey D. Luffy".to_string(),
        role,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn customer_user() -> UserRecord {
    user(Role::Customer)
}

pub(crate) fn admin_user() -> UserRecord {
    user(Role::Admin)
}

pub(crate) fn storage_error() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}
