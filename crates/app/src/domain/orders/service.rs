//! Orders service.

use std::slice;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{
    Postgres, Transaction,
    error::{DatabaseError, ErrorKind},
};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        carts::repositories::PgCartsRepository,
        orders::{
            data::{
                DEFAULT_PAYMENT_METHOD, NewOrder, NewOrderItem, OrderDraft, OrderItemDraft,
                PaymentUpdate, StatusUpdate,
            },
            errors::OrdersServiceError,
            records::{OrderRecord, OrderUuid, PaymentDetails, ShippingAddress},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
            status::OrderStatus,
        },
        pricing::{PriceBreakdown, PricingPolicy, items_subtotal},
        products::{
            records::{ProductRecord, ProductUuid},
            repository::PgProductsRepository,
        },
        users::records::{Actor, UserUuid},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    policy: PricingPolicy,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    products_repository: PgProductsRepository,
    carts_repository: PgCartsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, policy: PricingPolicy) -> Self {
        Self {
            db,
            policy,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
            carts_repository: PgCartsRepository::new(),
        }
    }

    async fn lock_accessible(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let order = self
            .orders_repository
            .lock_order(tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if !actor.may_access(order.user_uuid) {
            return Err(OrdersServiceError::Forbidden);
        }

        Ok(order)
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut order: OrderRecord,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.items_repository
            .attach_items(tx, slice::from_mut(&mut order))
            .await?;

        Ok(order)
    }

    /// Cancel a locked order, returning its stock.
    async fn cancel_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderRecord,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !order.status.is_cancellable() {
            return Err(OrdersServiceError::NotCancellable(order.status));
        }

        let order = self.with_items(tx, order).await?;

        for item in &order.items {
            if let Some(product) = item.product_uuid {
                self.products_repository
                    .release_stock(tx, product, item.quantity)
                    .await?;
            }
        }

        let mut cancelled = self
            .orders_repository
            .update_status(
                tx,
                order.uuid,
                OrderStatus::Cancelled,
                order.tracking_number.as_deref(),
                Timestamp::now(),
            )
            .await?;

        cancelled.items = order.items;

        Ok(cancelled)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.create_order",
        skip(self, order),
        fields(order_uuid = %order.uuid, user_uuid = %user, item_count = order.items.len()),
        err
    )]
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let shipping_address = validate_new_order(&order)?;
        let quantities = aggregate_quantities(&order.items);
        let product_uuids: Vec<ProductUuid> = quantities.iter().map(|(uuid, _)| *uuid).collect();

        let mut tx = self.db.begin_transaction().await?;

        let products: FxHashMap<ProductUuid, ProductRecord> = self
            .products_repository
            .lock_products(&mut tx, &product_uuids)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        check_stock(&quantities, &products)?;

        let items = snapshot_items(&order.items, &products)?;
        let prices = self.policy.quote(items_subtotal(
            items.iter().map(|item| (item.unit_price, item.quantity)),
        ));

        warn_on_client_price_mismatch(&order, &items, prices);

        for (product, quantity) in &quantities {
            let reserved = self
                .products_repository
                .reserve_stock(&mut tx, *product, *quantity)
                .await?;

            if reserved == 0 {
                return Err(insufficient_stock(*product, *quantity, &products));
            }
        }

        let draft = OrderDraft {
            uuid: order.uuid,
            user_uuid: user,
            items,
            shipping_address,
            payment_method: order
                .payment_method
                .filter(|method| !method.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            prices,
            paid_at: None,
            payment: PaymentDetails::default(),
        };

        let mut created = self
            .orders_repository
            .insert_order(&mut tx, &draft)
            .await?
            .ok_or(OrdersServiceError::AlreadyExists)?;

        created.items = self
            .items_repository
            .insert_items(&mut tx, created.uuid, &draft.items)
            .await?;

        self.carts_repository.clear_for_user(&mut tx, user).await?;

        tx.commit().await?;

        info!(total = created.prices.total, "order created");

        Ok(created)
    }

    async fn list_orders_for_user(
        &self,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut orders = self
            .orders_repository
            .list_orders_for_user(&mut tx, user)
            .await?;

        self.items_repository
            .attach_items(&mut tx, &mut orders)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut orders = self.orders_repository.list_orders(&mut tx).await?;

        self.items_repository
            .attach_items(&mut tx, &mut orders)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn get_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders_repository.get_order(&mut tx, order).await?;

        if !actor.may_access(order.user_uuid) {
            return Err(OrdersServiceError::Forbidden);
        }

        let order = self.with_items(&mut tx, order).await?;

        tx.commit().await?;

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.pay_order",
        skip(self, actor, payment),
        fields(order_uuid = %order, payment_reference = %payment.reference),
        err
    )]
    async fn pay_order(
        &self,
        actor: Actor,
        order: OrderUuid,
        payment: PaymentUpdate,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if payment.reference.trim().is_empty() {
            return Err(OrdersServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let order = self.lock_accessible(&mut tx, actor, order).await?;

        if order.status == OrderStatus::Cancelled {
            return Err(OrdersServiceError::NotPayable(order.status));
        }

        if order.is_paid {
            let order = self.with_items(&mut tx, order).await?;
            tx.commit().await?;

            info!("order already paid");

            return Ok(order);
        }

        let paid = self
            .orders_repository
            .mark_paid(&mut tx, order.uuid, &payment, Timestamp::now())
            .await
            .map_err(payment_reference_error)?
            .ok_or(OrdersServiceError::NotFound)?;

        let paid = self.with_items(&mut tx, paid).await?;

        tx.commit().await?;

        info!("order marked paid");

        Ok(paid)
    }

    #[tracing::instrument(
        name = "orders.cancel_order",
        skip(self, actor),
        fields(order_uuid = %order),
        err
    )]
    async fn cancel_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.lock_accessible(&mut tx, actor, order).await?;
        let cancelled = self.cancel_locked(&mut tx, order).await?;

        tx.commit().await?;

        info!("order cancelled");

        Ok(cancelled)
    }

    async fn delete_order(&self, actor: Actor, order: OrderUuid) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.lock_accessible(&mut tx, actor, order).await?;

        if !actor.is_admin() && order.status.is_fulfilled() {
            return Err(OrdersServiceError::NotDeletable(order.status));
        }

        let rows_affected = self
            .orders_repository
            .delete_order(&mut tx, order.uuid)
            .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        tx.commit().await?;

        info!(order_uuid = %order.uuid, "order deleted");

        Ok(())
    }

    #[tracing::instrument(
        name = "orders.update_status",
        skip(self, update),
        fields(order_uuid = %order, status = %update.status),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .orders_repository
            .lock_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if update.status == OrderStatus::Cancelled {
            let cancelled = self.cancel_locked(&mut tx, current).await?;
            tx.commit().await?;

            return Ok(cancelled);
        }

        if !current.status.can_transition_to(update.status) {
            return Err(OrdersServiceError::InvalidTransition {
                from: current.status,
                to: update.status,
            });
        }

        let tracking_number = update
            .tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|tracking| !tracking.is_empty())
            .or(current.tracking_number.as_deref());

        let updated = self
            .orders_repository
            .update_status(
                &mut tx,
                current.uuid,
                update.status,
                tracking_number,
                Timestamp::now(),
            )
            .await?;

        let updated = self.with_items(&mut tx, updated).await?;

        tx.commit().await?;

        info!(from = %current.status, "order status updated");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Place an order for `user`, reserving stock and pricing it server-side.
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The user's orders, newest first.
    async fn list_orders_for_user(
        &self,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Every order, newest first.
    async fn list_orders(&self) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// A single order, visible to its owner and admins.
    async fn get_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Record a payment. Paying a paid order returns it unchanged.
    async fn pay_order(
        &self,
        actor: Actor,
        order: OrderUuid,
        payment: PaymentUpdate,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Cancel a pending or processing order and return its stock.
    async fn cancel_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Hard-delete an order.
    async fn delete_order(&self, actor: Actor, order: OrderUuid) -> Result<(), OrdersServiceError>;

    /// Move an order along its fulfillment lifecycle.
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

fn validate_new_order(order: &NewOrder) -> Result<ShippingAddress, OrdersServiceError> {
    if order.items.is_empty() {
        return Err(OrdersServiceError::EmptyOrder);
    }

    if order.items.iter().any(|item| item.quantity == 0) {
        return Err(OrdersServiceError::InvalidQuantity);
    }

    order
        .shipping_address
        .clone()
        .filter(ShippingAddress::is_complete)
        .ok_or(OrdersServiceError::MissingShippingAddress)
}

/// Total requested quantity per product, in uuid order.
fn aggregate_quantities(items: &[NewOrderItem]) -> Vec<(ProductUuid, u32)> {
    let mut totals: FxHashMap<ProductUuid, u32> = FxHashMap::default();

    for item in items {
        let total = totals.entry(item.product_uuid).or_default();
        *total = total.saturating_add(item.quantity);
    }

    let mut totals: Vec<(ProductUuid, u32)> = totals.into_iter().collect();
    totals.sort_unstable_by_key(|(uuid, _)| *uuid);
    totals
}

fn check_stock(
    quantities: &[(ProductUuid, u32)],
    products: &FxHashMap<ProductUuid, ProductRecord>,
) -> Result<(), OrdersServiceError> {
    for (uuid, requested) in quantities {
        let product = products
            .get(uuid)
            .ok_or(OrdersServiceError::ProductNotFound(*uuid))?;

        if product.stock < *requested {
            return Err(insufficient_stock(*uuid, *requested, products));
        }
    }

    Ok(())
}

fn insufficient_stock(
    product: ProductUuid,
    requested: u32,
    products: &FxHashMap<ProductUuid, ProductRecord>,
) -> OrdersServiceError {
    let (name, available) = products
        .get(&product)
        .map(|record| (record.name.clone(), record.stock))
        .unwrap_or_default();

    OrdersServiceError::InsufficientStock {
        product,
        name,
        available,
        requested,
    }
}

fn snapshot_items(
    items: &[NewOrderItem],
    products: &FxHashMap<ProductUuid, ProductRecord>,
) -> Result<Vec<OrderItemDraft>, OrdersServiceError> {
    items
        .iter()
        .map(|item| {
            let product = products
                .get(&item.product_uuid)
                .ok_or(OrdersServiceError::ProductNotFound(item.product_uuid))?;

            Ok(OrderItemDraft {
                product_uuid: Some(product.uuid),
                name: product.name.clone(),
                image: product.image.clone(),
                unit_price: product.effective_price(),
                quantity: item.quantity,
                size: item.size.clone(),
                color: item.color.clone(),
            })
        })
        .collect()
}

fn warn_on_client_price_mismatch(
    order: &NewOrder,
    items: &[OrderItemDraft],
    prices: PriceBreakdown,
) {
    for (requested, snapshot) in order.items.iter().zip(items) {
        if let Some(client_unit_price) = requested.client_unit_price
            && client_unit_price != snapshot.unit_price
        {
            warn!(
                product_uuid = %requested.product_uuid,
                client_unit_price,
                server_unit_price = snapshot.unit_price,
                "client unit price differs from catalog price"
            );
        }
    }

    if let Some(client) = order.client_prices
        && client != prices
    {
        warn!(
            client_items = client.items,
            client_tax = client.tax,
            client_shipping = client.shipping,
            client_total = client.total,
            server_items = prices.items,
            server_tax = prices.tax,
            server_shipping = prices.shipping,
            server_total = prices.total,
            "client price breakdown differs from server quote"
        );
    }
}

fn payment_reference_error(error: sqlx::Error) -> OrdersServiceError {
    if error.as_database_error().map(DatabaseError::kind) == Some(ErrorKind::UniqueViolation) {
        OrdersServiceError::PaymentReferenceInUse
    } else {
        error.into()
    }
}
