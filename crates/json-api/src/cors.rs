//! Cross-origin request handling

use std::time::Duration;

use salvo::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Cors, CorsHandler},
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use tracing::warn;

use crate::config::cors::CorsConfig;

/// Build the CORS hoop for the configured origins.
///
/// Origins that are not valid header values are skipped with a warning.
pub(crate) fn handler(config: &CorsConfig) -> CorsHandler {
    let origins = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(source) => {
                warn!(origin, "ignoring invalid CORS origin: {source}");

                None
            }
        })
        .collect::<Vec<_>>();

    Cors::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([AUTHORIZATION, CONTENT_TYPE]))
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
        .into_handler()
}
