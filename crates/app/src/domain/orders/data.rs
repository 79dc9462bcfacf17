//! Orders Data

use jiff::Timestamp;

use crate::domain::{
    orders::{
        records::{OrderUuid, PaymentDetails, ShippingAddress},
        status::OrderStatus,
    },
    pricing::PriceBreakdown,
    products::records::ProductUuid,
    users::records::UserUuid,
};

/// Default payment method tag.
pub const DEFAULT_PAYMENT_METHOD: &str = "card";

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub items: Vec<NewOrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    /// Totals as the client computed them. Compared, logged, never stored.
    pub client_prices: Option<PriceBreakdown>,
}

/// A requested line: a product and how many of it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Unit price the client displayed. Advisory only.
    pub client_unit_price: Option<u64>,
}

/// Payment result reported by the client or the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub reference: String,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email: Option<String>,
}

/// Admin status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    /// Replaces the stored tracking number when present.
    pub tracking_number: Option<String>,
}

/// Everything needed to insert an order row and its items.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderDraft {
    pub(crate) uuid: OrderUuid,
    pub(crate) user_uuid: UserUuid,
    pub(crate) items: Vec<OrderItemDraft>,
    pub(crate) shipping_address: ShippingAddress,
    pub(crate) payment_method: String,
    pub(crate) prices: PriceBreakdown,
    pub(crate) paid_at: Option<Timestamp>,
    pub(crate) payment: PaymentDetails,
}

/// Snapshot of one purchased line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderItemDraft {
    pub(crate) product_uuid: Option<ProductUuid>,
    pub(crate) name: String,
    pub(crate) image: Option<String>,
    pub(crate) unit_price: u64,
    pub(crate) quantity: u32,
    pub(crate) size: Option<String>,
    pub(crate) color: Option<String>,
}
