//! Order Items Repository

use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_param, count_param, try_get_amount, try_get_count},
    domain::{
        orders::{
            data::OrderItemDraft,
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderUuid},
        },
        products::records::ProductUuid,
    },
};

const INSERT_ORDER_ITEM_SQL: &str = include_str!("../sql/insert_order_item.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("../sql/get_order_items.sql");

/// An item row tagged with its order, as read in bulk.
struct OwnedOrderItem {
    order_uuid: Uuid,
    item: OrderItemRecord,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        items: &[OrderItemDraft],
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let mut inserted = Vec::with_capacity(items.len());

        for (position, item) in (0_u32..).zip(items) {
            let uuid = OrderItemUuid::new();

            query(INSERT_ORDER_ITEM_SQL)
                .bind(uuid.into_uuid())
                .bind(order.into_uuid())
                .bind(count_param("position", position)?)
                .bind(item.product_uuid.map(ProductUuid::into_uuid))
                .bind(&item.name)
                .bind(item.image.as_deref())
                .bind(amount_param("unit_price", item.unit_price)?)
                .bind(count_param("quantity", item.quantity)?)
                .bind(item.size.as_deref())
                .bind(item.color.as_deref())
                .execute(&mut **tx)
                .await?;

            inserted.push(OrderItemRecord {
                uuid,
                product_uuid: item.product_uuid,
                name: item.name.clone(),
                image: item.image.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                size: item.size.clone(),
                color: item.color.clone(),
            });
        }

        Ok(inserted)
    }

    /// Load items for every order in `orders`, in place.
    pub(crate) async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &mut [OrderRecord],
    ) -> Result<(), sqlx::Error> {
        if orders.is_empty() {
            return Ok(());
        }

        let uuids: Vec<Uuid> = orders.iter().map(|order| order.uuid.into_uuid()).collect();

        let rows = query_as::<Postgres, OwnedOrderItem>(GET_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut by_order: FxHashMap<Uuid, Vec<OrderItemRecord>> = FxHashMap::default();

        for row in rows {
            by_order.entry(row.order_uuid).or_default().push(row.item);
        }

        for order in orders {
            order.items = by_order
                .remove(&order.uuid.into_uuid())
                .unwrap_or_default();
        }

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for OwnedOrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order_uuid: row.try_get("order_uuid")?,
            item: OrderItemRecord {
                uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
                product_uuid: row
                    .try_get::<Option<Uuid>, _>("product_uuid")?
                    .map(ProductUuid::from_uuid),
                name: row.try_get("name")?,
                image: row.try_get("image")?,
                unit_price: try_get_amount(row, "unit_price")?,
                quantity: try_get_count(row, "quantity")?,
                size: row.try_get("size")?,
                color: row.try_get("color")?,
            },
        })
    }
}
