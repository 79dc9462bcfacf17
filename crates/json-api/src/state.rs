//! Shared request state

use std::sync::Arc;

use storefront_app::context::AppContext;

/// Injected into every request's depot.
#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,

    /// Whether error responses carry their internal `error` detail.
    pub(crate) expose_error_details: bool,
}

impl State {
    pub(crate) fn new(app: AppContext, expose_error_details: bool) -> Arc<Self> {
        Arc::new(Self {
            app,
            expose_error_details,
        })
    }
}
