//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{
        amount_param, count_param, small_param, try_get_amount, try_get_count, try_get_small,
    },
    domain::products::{
        data::{NewProduct, ProductFilter, ProductUpdate},
        records::{ProductRecord, ProductUuid},
    },
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const GET_PRODUCTS_SQL: &str = include_str!("sql/get_products.sql");
const LOCK_PRODUCTS_SQL: &str = include_str!("sql/lock_products.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const RELEASE_STOCK_SQL: &str = include_str!("sql/release_stock.sql");
const SETTLE_STOCK_SQL: &str = include_str!("sql/settle_stock.sql");
const SET_RATING_SQL: &str = include_str!("sql/set_rating.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .bind(filter.category.map(|category| category.as_str()))
            .bind(filter.anime_series())
            .bind(filter.featured)
            .bind(filter.search_pattern())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Active products among `products`, in no particular order. Missing
    /// uuids are simply absent from the result.
    pub(crate) async fn get_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = products.iter().map(|uuid| uuid.into_uuid()).collect();

        query_as::<Postgres, ProductRecord>(GET_PRODUCTS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    /// Like [`Self::get_products`], but takes row locks in uuid order so
    /// concurrent orders over the same products cannot deadlock.
    pub(crate) async fn lock_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = products.iter().map(|uuid| uuid.into_uuid()).collect();

        query_as::<Postgres, ProductRecord>(LOCK_PRODUCTS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(product.name.trim())
            .bind(&product.description)
            .bind(product.category.as_str())
            .bind(product.anime_series.trim())
            .bind(product.image.as_deref())
            .bind(amount_param("price", product.price)?)
            .bind(
                product
                    .discount_price
                    .map(|discount| amount_param("discount_price", discount))
                    .transpose()?,
            )
            .bind(count_param("stock", product.stock)?)
            .bind(product.sizes.as_slice())
            .bind(product.colors.as_slice())
            .bind(product.tags.as_slice())
            .bind(product.is_featured)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        update: &ProductUpdate,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(update.name.trim())
            .bind(&update.description)
            .bind(update.category.as_str())
            .bind(update.anime_series.trim())
            .bind(update.image.as_deref())
            .bind(amount_param("price", update.price)?)
            .bind(
                update
                    .discount_price
                    .map(|discount| amount_param("discount_price", discount))
                    .transpose()?,
            )
            .bind(count_param("stock", update.stock)?)
            .bind(update.sizes.as_slice())
            .bind(update.colors.as_slice())
            .bind(update.tags.as_slice())
            .bind(update.is_featured)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Move `quantity` from stock to sold. Affects no row when stock is short.
    pub(crate) async fn reserve_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        self.adjust(tx, RESERVE_STOCK_SQL, product, quantity).await
    }

    /// Return `quantity` to stock; sold never drops below zero.
    pub(crate) async fn release_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        self.adjust(tx, RELEASE_STOCK_SQL, product, quantity).await
    }

    /// Record a sale that already happened; stock saturates at zero.
    pub(crate) async fn settle_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        self.adjust(tx, SETTLE_STOCK_SQL, product, quantity).await
    }

    /// Store the review aggregates computed for a product.
    pub(crate) async fn set_rating(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        rating_tenths: u16,
        num_reviews: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_RATING_SQL)
            .bind(product.into_uuid())
            .bind(small_param("rating_tenths", rating_tenths)?)
            .bind(count_param("num_reviews", num_reviews)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn adjust(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sql: &'static str,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(sql)
            .bind(product.into_uuid())
            .bind(count_param("quantity", quantity)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let category: String = row.try_get("category")?;

        let discount_price = row
            .try_get::<Option<i64>, _>("discount_price")?
            .map(u64::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "discount_price".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: category.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "category".to_string(),
                source: Box::new(e),
            })?,
            anime_series: row.try_get("anime_series")?,
            image: row.try_get("image")?,
            price: try_get_amount(row, "price")?,
            discount_price,
            stock: try_get_count(row, "stock")?,
            sold: try_get_count(row, "sold")?,
            sizes: row.try_get("sizes")?,
            colors: row.try_get("colors")?,
            tags: row.try_get("tags")?,
            is_featured: row.try_get("is_featured")?,
            rating_tenths: try_get_small(row, "rating_tenths")?,
            num_reviews: try_get_count(row, "num_reviews")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
