//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;

use storefront_app::domain::users::records::UserRecord;

use crate::errors::ApiError;

/// Helpers for reading request-scoped values out of the depot.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_current_user(&mut self, user: UserRecord);

    fn current_user_or_401(&self) -> Result<&UserRecord, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>()
            .map_err(|_ignored| ApiError::internal("Server error"))
    }

    fn insert_current_user(&mut self, user: UserRecord) {
        self.inject(user);
    }

    fn current_user_or_401(&self) -> Result<&UserRecord, ApiError> {
        self.obtain::<UserRecord>()
            .map_err(|_ignored| ApiError::unauthorized("Not authorized, no token"))
    }
}
