//! Payments service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    orders::status::OrderStatus, payments::gateway::GatewayError, products::records::ProductUuid,
};

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("no items to pay for")]
    EmptyCart,

    #[error("shipping address is required")]
    MissingShippingAddress,

    #[error("quantity must be at least one")]
    InvalidQuantity,

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("order not found")]
    OrderNotFound,

    #[error("order is already paid")]
    OrderAlreadyPaid,

    #[error("cannot pay for an order that is {0}")]
    OrderNotPayable(OrderStatus),

    #[error("charged {charged:?} does not match order total {expected}")]
    AmountMismatch { expected: u64, charged: Option<u64> },

    #[error("not authorized to pay for this order")]
    Forbidden,

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("payment gateway configuration error")]
    GatewayConfiguration,

    #[error("payment gateway unavailable")]
    Gateway(#[source] GatewayError),

    #[error("checkout session not found")]
    SessionNotFound,

    #[error("payment incomplete: {status}")]
    PaymentIncomplete { status: String },

    #[error("payment already recorded")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<GatewayError> for PaymentsServiceError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::InvalidRequest(message) => Self::InvalidPrice(message),
            GatewayError::Authentication => Self::GatewayConfiguration,
            GatewayError::NotFound => Self::SessionNotFound,
            error @ (GatewayError::Http(_) | GatewayError::UnexpectedResponse(_)) => {
                Self::Gateway(error)
            }
        }
    }
}

impl From<Error> for PaymentsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
