//! Payments

pub mod data;
pub mod errors;
pub mod gateway;
pub(crate) mod reconcile;
pub mod service;
pub mod stripe;

pub use errors::PaymentsServiceError;
pub use gateway::{GatewayError, PaymentGateway};
pub use service::*;
