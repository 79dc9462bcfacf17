//! Authentication

mod errors;
pub(crate) mod middleware;
