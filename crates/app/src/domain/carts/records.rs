//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{pricing::items_subtotal, products::records::ProductUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
#[derive(Debug, Clone, PartialEq)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub user_uuid: UserUuid,
    pub subtotal: u64,
    pub items: Vec<CartItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    /// Attach items and recompute the subtotal from their snapshots.
    #[must_use]
    pub fn with_items(mut self, items: Vec<CartItemRecord>) -> Self {
        self.subtotal = items_subtotal(items.iter().map(|item| (item.unit_price, item.quantity)));
        self.items = items;
        self
    }
}

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// CartItem Record
#[derive(Debug, Clone, PartialEq)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: u64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItemRecord {
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}
