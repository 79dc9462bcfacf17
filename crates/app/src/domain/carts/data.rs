//! Cart Data

use crate::domain::{carts::records::CartItemUuid, products::records::ProductUuid};

/// New Cart Item Data
///
/// Adding a product/size/color combination already in the cart increases that
/// line's quantity instead; `uuid` is then unused.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}
