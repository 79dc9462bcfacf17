//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{orders::status::OrderStatus, products::records::ProductUuid};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("no order items")]
    EmptyOrder,

    #[error("shipping address is required")]
    MissingShippingAddress,

    #[error("quantity must be at least one")]
    InvalidQuantity,

    #[error("insufficient stock for {name}: {available} available, {requested} requested")]
    InsufficientStock {
        product: ProductUuid,
        name: String,
        available: u32,
        requested: u32,
    },

    #[error("not authorized to access this order")]
    Forbidden,

    #[error("cannot cancel an order that is {0}")]
    NotCancellable(OrderStatus),

    #[error("cannot pay for an order that is {0}")]
    NotPayable(OrderStatus),

    #[error("cannot delete an order that is {0}")]
    NotDeletable(OrderStatus),

    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("payment reference already used by another order")]
    PaymentReferenceInUse,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
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
