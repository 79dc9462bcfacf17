//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            records::{CartItemUuid, CartRecord},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        products::{
            records::{ProductRecord, ProductUuid},
            repository::PgProductsRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
    products_repository: PgProductsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    async fn load_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartRecord,
    ) -> Result<CartRecord, CartsServiceError> {
        let items = self.items_repository.get_cart_items(tx, cart.uuid).await?;

        Ok(cart.with_items(items))
    }

    async fn product_with_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line_product: ProductUuid,
        quantity: u32,
    ) -> Result<ProductRecord, CartsServiceError> {
        let product = self
            .products_repository
            .get_product(tx, line_product)
            .await
            .map_err(CartsServiceError::from_product_lookup)?;

        if product.stock < quantity {
            return Err(CartsServiceError::InsufficientStock {
                available: product.stock,
            });
        }

        Ok(product)
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;
        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartRecord, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;

        let existing = self
            .items_repository
            .find_matching_line(&mut tx, cart.uuid, &item)
            .await?;

        match existing {
            Some(line) => {
                let quantity = line.quantity.saturating_add(item.quantity);
                let product = self
                    .product_with_stock(&mut tx, item.product_uuid, quantity)
                    .await?;

                self.items_repository
                    .update_cart_item(
                        &mut tx,
                        cart.uuid,
                        line.uuid,
                        quantity,
                        product.effective_price(),
                    )
                    .await?;
            }
            None => {
                let product = self
                    .product_with_stock(&mut tx, item.product_uuid, item.quantity)
                    .await?;

                self.items_repository
                    .create_cart_item(&mut tx, cart.uuid, &item, product.effective_price())
                    .await?;
            }
        }

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn update_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;
        let line = self.items_repository.get_line(&mut tx, cart.uuid, item).await?;

        let product = self
            .product_with_stock(&mut tx, line.product_uuid, quantity)
            .await?;

        self.items_repository
            .update_cart_item(&mut tx, cart.uuid, item, quantity, product.effective_price())
            .await?;

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn remove_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;

        let rows_affected = self
            .items_repository
            .delete_cart_item(&mut tx, cart.uuid, item)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn clear_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;

        self.carts_repository.clear_for_user(&mut tx, user).await?;
        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(cart.with_items(Vec::new()))
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the user's cart, creating an empty one on first use.
    async fn get_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError>;

    /// Add a product to the cart, merging with a matching line.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Set the quantity of a cart line.
    async fn update_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove a cart line.
    async fn remove_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove every line from the cart.
    async fn clear_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError>;
}
