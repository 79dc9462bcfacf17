//! Reviews Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::{small_param, try_get_count, try_get_small},
    domain::{
        products::records::ProductUuid,
        reviews::{
            data::{NewReview, PageRequest},
            records::{ReviewRecord, ReviewUuid},
        },
        users::records::UserUuid,
    },
};

const GET_REVIEW_SQL: &str = include_str!("sql/get_review.sql");
const LIST_PRODUCT_REVIEWS_SQL: &str = include_str!("sql/list_product_reviews.sql");
const CREATE_REVIEW_SQL: &str = include_str!("sql/create_review.sql");
const UPDATE_REVIEW_SQL: &str = include_str!("sql/update_review.sql");
const DELETE_REVIEW_SQL: &str = include_str!("sql/delete_review.sql");
const RATING_COUNTS_SQL: &str = include_str!("sql/rating_counts.sql");
const FIND_USER_REVIEW_SQL: &str = include_str!("sql/find_user_review.sql");
const HAS_DELIVERED_PURCHASE_SQL: &str = include_str!("sql/has_delivered_purchase.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReviewsRepository;

impl PgReviewsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
    ) -> Result<Option<ReviewRecord>, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(GET_REVIEW_SQL)
            .bind(review.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_product_reviews(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        page: PageRequest,
    ) -> Result<Vec<ReviewRecord>, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(LIST_PRODUCT_REVIEWS_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(page.per_page()))
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        author: UserUuid,
        review: &NewReview,
        is_verified_purchase: bool,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(CREATE_REVIEW_SQL)
            .bind(review.uuid.into_uuid())
            .bind(review.product_uuid.into_uuid())
            .bind(author.into_uuid())
            .bind(small_param("rating", u16::from(review.rating))?)
            .bind(review.comment.trim())
            .bind(is_verified_purchase)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
        rating: u8,
        comment: &str,
    ) -> Result<ReviewRecord, sqlx::Error> {
        query_as::<Postgres, ReviewRecord>(UPDATE_REVIEW_SQL)
            .bind(review.into_uuid())
            .bind(small_param("rating", u16::from(rating))?)
            .bind(comment.trim())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        review: ReviewUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_REVIEW_SQL)
            .bind(review.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// `(stars, reviews)` for every star rating the product has received.
    pub(crate) async fn rating_counts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<(u8, u32)>, sqlx::Error> {
        let rows = query(RATING_COUNTS_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| Ok((try_get_small(row, "rating")?, try_get_count(row, "reviews")?)))
            .collect()
    }

    pub(crate) async fn find_user_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        author: UserUuid,
    ) -> Result<Option<ReviewUuid>, sqlx::Error> {
        let uuid = query_scalar::<Postgres, uuid::Uuid>(FIND_USER_REVIEW_SQL)
            .bind(product.into_uuid())
            .bind(author.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(uuid.map(ReviewUuid::from_uuid))
    }

    /// Whether `author` has a delivered order containing `product`.
    pub(crate) async fn has_delivered_purchase(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        author: UserUuid,
        product: ProductUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(HAS_DELIVERED_PURCHASE_SQL)
            .bind(author.into_uuid())
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ReviewRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ReviewUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            author_name: row.try_get("author_name")?,
            rating: try_get_small(row, "rating")?,
            comment: row.try_get("comment")?,
            is_verified_purchase: row.try_get("is_verified_purchase")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
