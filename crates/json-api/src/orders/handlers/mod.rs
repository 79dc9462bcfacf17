//! Order Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    orders::{
        data::NewOrderItem,
        records::{OrderItemRecord, OrderRecord, PaymentDetails, ShippingAddress},
    },
    pricing::PriceBreakdown,
};

pub(crate) mod cancel;
pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod mine;
pub(crate) mod pay;
pub(crate) mod status;

/// Shipping Address
///
/// Accepts both `street`/`zip` and the `address`/`zipCode`/`postalCode` spellings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShippingAddressPayload {
    #[serde(default, alias = "address")]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, alias = "zipCode", alias = "postalCode")]
    pub zip: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

impl From<ShippingAddressPayload> for ShippingAddress {
    fn from(payload: ShippingAddressPayload) -> Self {
        Self {
            street: payload.street,
            city: payload.city,
            state: payload.state,
            zip: payload.zip,
            country: payload.country,
            phone: payload.phone,
        }
    }
}

impl From<ShippingAddress> for ShippingAddressPayload {
    fn from(address: ShippingAddress) -> Self {
        Self {
            street: address.street,
            city: address.city,
            state: address.state,
            zip: address.zip,
            country: address.country,
            phone: address.phone,
        }
    }
}

/// A requested line in an order or checkout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineItemPayload {
    #[serde(alias = "productId", alias = "product")]
    pub product_uuid: Uuid,
    #[serde(alias = "qty")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Unit price the client displayed
    #[serde(default)]
    pub price: Option<u64>,
}

impl From<LineItemPayload> for NewOrderItem {
    fn from(item: LineItemPayload) -> Self {
        Self {
            product_uuid: item.product_uuid.into(),
            quantity: item.quantity,
            size: item.size,
            color: item.color,
            client_unit_price: item.price,
        }
    }
}

/// Totals the client displayed. Only compared against the server's figures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClientPrices {
    #[serde(default)]
    pub items_price: Option<u64>,
    #[serde(default)]
    pub tax_price: Option<u64>,
    #[serde(default)]
    pub shipping_price: Option<u64>,
    #[serde(default)]
    pub total_price: Option<u64>,
}

impl ClientPrices {
    /// The full breakdown, when the client sent every figure.
    pub(crate) fn breakdown(&self) -> Option<PriceBreakdown> {
        Some(PriceBreakdown {
            items: self.items_price?,
            tax: self.tax_price?,
            shipping: self.shipping_price?,
            total: self.total_price?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,
    /// Absent once the product has been removed from the catalog
    pub product_uuid: Option<Uuid>,
    pub name: String,
    pub image: Option<String>,
    pub price: u64,
    pub quantity: u32,
    pub line_total: u64,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.map(Into::into),
            line_total: item.line_total(),
            name: item.name,
            image: item.image,
            price: item.unit_price,
            quantity: item.quantity,
            size: item.size,
            color: item.color,
        }
    }
}

/// Payment Result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentResultResponse {
    pub id: String,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email_address: Option<String>,
}

impl PaymentResultResponse {
    fn from_details(details: PaymentDetails) -> Option<Self> {
        Some(Self {
            id: details.reference?,
            status: details.status,
            update_time: details.update_time,
            email_address: details.email,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderResponse {
    /// The unique identifier of the order
    pub uuid: Uuid,

    /// The customer who placed the order
    pub user: Uuid,

    pub order_items: Vec<OrderItemResponse>,

    pub shipping_address: ShippingAddressPayload,

    pub payment_method: String,

    /// Sum of line totals in minor units
    pub items_price: u64,

    pub tax_price: u64,

    pub shipping_price: u64,

    pub total_price: u64,

    pub is_paid: bool,

    pub paid_at: Option<String>,

    pub payment_result: Option<PaymentResultResponse>,

    /// pending, processing, shipped, delivered or cancelled
    pub status: String,

    pub tracking_number: Option<String>,

    pub is_delivered: bool,

    pub delivered_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into(),
            user: order.user_uuid.into(),
            order_items: order.items.into_iter().map(Into::into).collect(),
            shipping_address: order.shipping_address.into(),
            payment_method: order.payment_method,
            items_price: order.prices.items,
            tax_price: order.prices.tax,
            shipping_price: order.prices.shipping,
            total_price: order.prices.total,
            is_paid: order.is_paid,
            paid_at: order.paid_at.map(|at| at.to_string()),
            payment_result: PaymentResultResponse::from_details(order.payment),
            status: order.status.to_string(),
            tracking_number: order.tracking_number,
            is_delivered: order.is_delivered,
            delivered_at: order.delivered_at.map(|at| at.to_string()),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Single Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub order: OrderResponse,
}

impl OrderEnvelope {
    pub(crate) fn with_message(order: OrderRecord, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            order: order.into(),
        }
    }
}

impl From<OrderRecord> for OrderEnvelope {
    fn from(order: OrderRecord) -> Self {
        Self {
            success: true,
            message: None,
            order: order.into(),
        }
    }
}

/// Order List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersEnvelope {
    pub success: bool,
    pub count: usize,
    pub orders: Vec<OrderResponse>,
}

impl From<Vec<OrderRecord>> for OrdersEnvelope {
    fn from(orders: Vec<OrderRecord>) -> Self {
        Self {
            success: true,
            count: orders.len(),
            orders: orders.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use jiff::Timestamp;

    use storefront_app::domain::{
        orders::{
            records::{
                OrderItemRecord, OrderItemUuid, OrderRecord, OrderUuid, PaymentDetails,
                ShippingAddress,
            },
            status::OrderStatus,
        },
        pricing::PriceBreakdown,
        products::records::ProductUuid,
        users::records::UserUuid,
    };

    use super::*;

    pub(crate) fn make_address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Grand Line".to_string(),
            city: "Mumbai".to_string(),
            state: "MH".to_string(),
            zip: "400001".to_string(),
            country: "India".to_string(),
            phone: "9999999999".to_string(),
        }
    }

    pub(crate) fn make_order(uuid: OrderUuid, user: UserUuid) -> OrderRecord {
        OrderRecord {
            uuid,
            user_uuid: user,
            items: vec![OrderItemRecord {
                uuid: OrderItemUuid::new(),
                product_uuid: Some(ProductUuid::new()),
                name: "Luffy Figure".to_string(),
                image: None,
                unit_price: 240_000,
                quantity: 2,
                size: None,
                color: None,
            }],
            shipping_address: make_address(),
            payment_method: "card".to_string(),
            prices: PriceBreakdown::from_parts(480_000, 86_400, 0),
            is_paid: false,
            paid_at: None,
            payment: PaymentDetails::default(),
            status: OrderStatus::Pending,
            tracking_number: None,
            is_delivered: false,
            delivered_at: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn order_response_flattens_prices_and_payment() {
        let mut order = make_order(OrderUuid::new(), UserUuid::new());

        order.is_paid = true;
        order.payment.reference = Some("cs_test_123".to_string());
        order.payment.status = Some("paid".to_string());

        let response = OrderResponse::from(order);

        assert_eq!(response.items_price, 480_000);
        assert_eq!(response.tax_price, 86_400);
        assert_eq!(response.total_price, 566_400);
        assert_eq!(response.order_items[0].line_total, 480_000);
        assert_eq!(
            response.payment_result.map(|payment| payment.id).as_deref(),
            Some("cs_test_123")
        );
    }

    #[test]
    fn unpaid_order_has_no_payment_result() {
        let response = OrderResponse::from(make_order(OrderUuid::new(), UserUuid::new()));

        assert!(response.payment_result.is_none());
        assert_eq!(response.status, "pending");
    }

    #[test]
    fn client_prices_require_every_figure() {
        let partial = ClientPrices {
            items_price: Some(100),
            ..ClientPrices::default()
        };

        assert_eq!(partial.breakdown(), None);

        let full = ClientPrices {
            items_price: Some(100),
            tax_price: Some(18),
            shipping_price: Some(50),
            total_price: Some(168),
        };

        assert_eq!(full.breakdown(), Some(PriceBreakdown::from_parts(100, 18, 50)));
    }

    #[test]
    fn shipping_address_accepts_alternate_field_names() -> Result<(), serde_json::Error> {
        let payload: ShippingAddressPayload = serde_json::from_value(serde_json::json!({
            "address": "1 Grand Line",
            "city": "Mumbai",
            "postalCode": "400001",
            "country": "India"
        }))?;

        let address = ShippingAddress::from(payload);

        assert_eq!(address.street, "1 Grand Line");
        assert_eq!(address.zip, "400001");
        assert!(address.is_complete());

        Ok(())
    }

    #[test]
    fn storefront_client_field_names_are_accepted() -> Result<(), serde_json::Error> {
        let product = ProductUuid::new();

        let address: ShippingAddressPayload = serde_json::from_value(serde_json::json!({
            "address": "1 Grand Line",
            "city": "Mumbai",
            "state": "MH",
            "zipCode": "400001",
            "country": "India"
        }))?;
        let item: LineItemPayload = serde_json::from_value(serde_json::json!({
            "productId": product.into_uuid(),
            "quantity": 3,
            "size": "M"
        }))?;

        assert_eq!(address.zip, "400001");
        assert_eq!(NewOrderItem::from(item).product_uuid, product);

        Ok(())
    }
}
