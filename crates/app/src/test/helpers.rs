//! Test Helpers

use crate::domain::{
    orders::{
        data::{NewOrder, NewOrderItem},
        records::{OrderUuid, ShippingAddress},
    },
    products::{
        ProductsService, ProductsServiceError,
        data::NewProduct,
        records::{Category, ProductRecord, ProductUuid},
    },
    users::{
        UsersService, UsersServiceError,
        data::NewUser,
        records::{Role, UserRecord, UserUuid},
    },
};

use super::TestContext;

pub(crate) fn new_product(uuid: ProductUuid, price: u64, stock: u32) -> NewProduct {
    NewProduct {
        uuid,
        name: "Test Product".to_string(),
        description: "A product for tests".to_string(),
        category: Category::Figures,
        anime_series: "One Piece".to_string(),
        image: None,
        price,
        discount_price: None,
        stock,
        sizes: Vec::new(),
        colors: Vec::new(),
        tags: Vec::new(),
        is_featured: false,
    }
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    price: u64,
    stock: u32,
) -> Result<ProductRecord, ProductsServiceError> {
    ctx.products
        .create_product(new_product(ProductUuid::new(), price, stock))
        .await
}

async fn create_user(ctx: &TestContext, role: Role) -> Result<UserRecord, UsersServiceError> {
    let uuid = UserUuid::new();

    ctx.users
        .create_user(NewUser {
            uuid,
            email: format!("{uuid}@example.com"),
            name: "Test User".to_string(),
            role,
        })
        .await
}

pub(crate) async fn create_customer(ctx: &TestContext) -> Result<UserRecord, UsersServiceError> {
    create_user(ctx, Role::Customer).await
}

pub(crate) async fn create_admin(ctx: &TestContext) -> Result<UserRecord, UsersServiceError> {
    create_user(ctx, Role::Admin).await
}

pub(crate) fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        street: "1 Going Merry Way".to_string(),
        city: "Mumbai".to_string(),
        state: "MH".to_string(),
        zip: "400001".to_string(),
        country: "India".to_string(),
        phone: "9999999999".to_string(),
    }
}

pub(crate) fn order_item(product: ProductUuid, quantity: u32) -> NewOrderItem {
    NewOrderItem {
        product_uuid: product,
        quantity,
        size: None,
        color: None,
        client_unit_price: None,
    }
}

pub(crate) fn new_order(items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        uuid: OrderUuid::new(),
        items,
        shipping_address: Some(shipping_address()),
        payment_method: None,
        client_prices: None,
    }
}
