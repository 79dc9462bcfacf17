//! Order Records

use jiff::Timestamp;

use crate::{
    domain::{
        orders::status::OrderStatus, pricing::PriceBreakdown, products::records::ProductUuid,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Street, city, postal code and country are all present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.city, &self.zip, &self.country]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Payment result recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentDetails {
    /// External payment id (checkout session id for hosted checkout).
    pub reference: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub update_time: Option<String>,
}

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub items: Vec<OrderItemRecord>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub prices: PriceBreakdown,
    pub is_paid: bool,
    pub paid_at: Option<Timestamp>,
    pub payment: PaymentDetails,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub is_delivered: bool,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order Item Record
///
/// Frozen at purchase time. `product_uuid` only links back for stock
/// restoration and is `None` once the product row is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub product_uuid: Option<ProductUuid>,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: u64,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl OrderItemRecord {
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Grand Line".to_string(),
            city: "Mumbai".to_string(),
            state: "MH".to_string(),
            zip: "400001".to_string(),
            country: "India".to_string(),
            phone: "9999999999".to_string(),
        }
    }

    #[test]
    fn complete_address_is_accepted() {
        assert!(address().is_complete());
    }

    #[test]
    fn state_and_phone_are_optional() {
        let address = ShippingAddress {
            state: String::new(),
            phone: String::new(),
            ..address()
        };

        assert!(address.is_complete());
    }

    #[test]
    fn blank_city_is_incomplete() {
        let address = ShippingAddress {
            city: "   ".to_string(),
            ..address()
        };

        assert!(!address.is_complete());
    }
}
