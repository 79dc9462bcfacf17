//! Authentication

mod errors;
mod jwt;
mod service;

pub use errors::*;
pub use jwt::*;
pub use service::*;
