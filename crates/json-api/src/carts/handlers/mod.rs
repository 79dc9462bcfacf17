//! Cart Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::carts::records::{CartItemRecord, CartRecord};

pub(crate) mod clear;
pub(crate) mod get;

/// Cart Item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    /// Effective price of the product when it was added
    pub unit_price: u64,
    pub line_total: u64,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl From<CartItemRecord> for CartItemResponse {
    fn from(item: CartItemRecord) -> Self {
        Self {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.into(),
            line_total: item.line_total(),
            name: item.name,
            image: item.image,
            quantity: item.quantity,
            unit_price: item.unit_price,
            size: item.size,
            color: item.color,
        }
    }
}

/// Cart
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartResponse {
    pub uuid: Uuid,
    pub items: Vec<CartItemResponse>,
    /// Sum of line totals in minor units
    pub subtotal: u64,
    pub updated_at: String,
}

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartEnvelope {
    pub success: bool,
    pub cart: CartResponse,
}

impl From<CartRecord> for CartEnvelope {
    fn from(cart: CartRecord) -> Self {
        Self {
            success: true,
            cart: CartResponse {
                uuid: cart.uuid.into(),
                items: cart.items.into_iter().map(Into::into).collect(),
                subtotal: cart.subtotal,
                updated_at: cart.updated_at.to_string(),
            },
        }
    }
}
