//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{amount_param, try_get_amount},
    domain::{
        orders::{
            data::{OrderDraft, PaymentUpdate},
            records::{OrderRecord, OrderUuid, PaymentDetails, ShippingAddress},
            status::OrderStatus,
        },
        pricing::PriceBreakdown,
        users::records::UserUuid,
    },
};

const INSERT_ORDER_SQL: &str = include_str!("../sql/insert_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const FIND_ORDER_BY_PAYMENT_REFERENCE_SQL: &str =
    include_str!("../sql/find_order_by_payment_reference.sql");
const LIST_ORDERS_FOR_USER_SQL: &str = include_str!("../sql/list_orders_for_user.sql");
const LIST_ORDERS_SQL: &str = include_str!("../sql/list_orders.sql");
const MARK_ORDER_PAID_SQL: &str = include_str!("../sql/mark_order_paid.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");
const DELETE_ORDER_SQL: &str = include_str!("../sql/delete_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the order row. Returns `None` when another order already holds
    /// the draft's payment reference.
    pub(crate) async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        draft: &OrderDraft,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let address = &draft.shipping_address;

        query_as::<Postgres, OrderRecord>(INSERT_ORDER_SQL)
            .bind(draft.uuid.into_uuid())
            .bind(draft.user_uuid.into_uuid())
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.zip)
            .bind(&address.country)
            .bind(&address.phone)
            .bind(&draft.payment_method)
            .bind(amount_param("items_price", draft.prices.items)?)
            .bind(amount_param("tax_price", draft.prices.tax)?)
            .bind(amount_param("shipping_price", draft.prices.shipping)?)
            .bind(amount_param("total_price", draft.prices.total)?)
            .bind(draft.paid_at.is_some())
            .bind(draft.paid_at.map(SqlxTimestamp::from))
            .bind(draft.payment.reference.as_deref())
            .bind(draft.payment.status.as_deref())
            .bind(draft.payment.email.as_deref())
            .bind(draft.payment.update_time.as_deref())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch the order and hold its row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_payment_reference(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_PAYMENT_REFERENCE_SQL)
            .bind(reference)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_FOR_USER_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Record a payment on an unpaid order. Returns `None` if the order is
    /// missing or already paid.
    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment: &PaymentUpdate,
        paid_at: Timestamp,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(MARK_ORDER_PAID_SQL)
            .bind(order.into_uuid())
            .bind(SqlxTimestamp::from(paid_at))
            .bind(&payment.reference)
            .bind(payment.status.as_deref())
            .bind(payment.update_time.as_deref())
            .bind(payment.email.as_deref())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
        tracking_number: Option<&str>,
        now: Timestamp,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(tracking_number)
            .bind(status == OrderStatus::Delivered)
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ORDER_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            items: Vec::new(),
            shipping_address: ShippingAddress {
                street: row.try_get("shipping_street")?,
                city: row.try_get("shipping_city")?,
                state: row.try_get("shipping_state")?,
                zip: row.try_get("shipping_zip")?,
                country: row.try_get("shipping_country")?,
                phone: row.try_get("shipping_phone")?,
            },
            payment_method: row.try_get("payment_method")?,
            prices: PriceBreakdown {
                items: try_get_amount(row, "items_price")?,
                tax: try_get_amount(row, "tax_price")?,
                shipping: try_get_amount(row, "shipping_price")?,
                total: try_get_amount(row, "total_price")?,
            },
            is_paid: row.try_get("is_paid")?,
            paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("paid_at")?
                .map(SqlxTimestamp::to_jiff),
            payment: PaymentDetails {
                reference: row.try_get("payment_reference")?,
                status: row.try_get("payment_status")?,
                email: row.try_get("payment_email")?,
                update_time: row.try_get("payment_update_time")?,
            },
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?,
            tracking_number: row.try_get("tracking_number")?,
            is_delivered: row.try_get("is_delivered")?,
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
