//! Reviews service.

use std::slice;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        products::{records::ProductUuid, repository::PgProductsRepository},
        reviews::{
            data::{NewReview, PageRequest, ReviewEligibility, ReviewPage, ReviewStats, ReviewUpdate},
            errors::ReviewsServiceError,
            records::{ReviewRecord, ReviewUuid},
            repository::PgReviewsRepository,
        },
        users::records::{Actor, UserUuid},
    },
};

#[derive(Debug, Clone)]
pub struct PgReviewsService {
    db: Db,
    repository: PgReviewsRepository,
    products_repository: PgProductsRepository,
}

impl PgReviewsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgReviewsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    /// Lock the product row so concurrent review writes aggregate in turn.
    /// `false` when the product is gone or soft-deleted.
    async fn lock_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<bool, ReviewsServiceError> {
        let locked = self
            .products_repository
            .lock_products(tx, slice::from_ref(&product))
            .await?;

        Ok(!locked.is_empty())
    }

    async fn refresh_rating(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ReviewStats, ReviewsServiceError> {
        let counts = self.repository.rating_counts(tx, product).await?;
        let stats = ReviewStats::from_counts(&counts);

        self.products_repository
            .set_rating(tx, product, stats.rating_tenths, stats.total_reviews)
            .await?;

        Ok(stats)
    }

    /// The review, if `author` wrote it.
    async fn authored_review(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        author: Actor,
        review: ReviewUuid,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        self.repository
            .get_review(tx, review)
            .await?
            .filter(|review| author.may_access(review.user_uuid))
            .ok_or(ReviewsServiceError::NotFound)
    }
}

#[async_trait]
impl ReviewsService for PgReviewsService {
    #[tracing::instrument(
        name = "reviews.create",
        skip(self, review),
        fields(product_uuid = %review.product_uuid, rating = review.rating),
        err
    )]
    async fn create_review(
        &self,
        author: UserUuid,
        review: NewReview,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        review.validate()?;

        let mut tx = self.db.begin_transaction().await?;

        if !self.lock_product(&mut tx, review.product_uuid).await? {
            return Err(ReviewsServiceError::ProductNotFound);
        }

        if self
            .repository
            .find_user_review(&mut tx, review.product_uuid, author)
            .await?
            .is_some()
        {
            return Err(ReviewsServiceError::AlreadyReviewed);
        }

        let verified = self
            .repository
            .has_delivered_purchase(&mut tx, author, review.product_uuid)
            .await?;

        let created = self
            .repository
            .create_review(&mut tx, author, &review, verified)
            .await?;

        let stats = self.refresh_rating(&mut tx, review.product_uuid).await?;

        tx.commit().await?;

        info!(
            review_uuid = %created.uuid,
            verified,
            rating_tenths = stats.rating_tenths,
            num_reviews = stats.total_reviews,
            "review created"
        );

        Ok(created)
    }

    async fn list_reviews(
        &self,
        product: ProductUuid,
        page: PageRequest,
    ) -> Result<ReviewPage, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let reviews = self
            .repository
            .list_product_reviews(&mut tx, product, page)
            .await?;
        let counts = self.repository.rating_counts(&mut tx, product).await?;

        tx.commit().await?;

        Ok(ReviewPage {
            reviews,
            page,
            total: u64::from(ReviewStats::from_counts(&counts).total_reviews),
        })
    }

    async fn update_review(
        &self,
        author: UserUuid,
        review: ReviewUuid,
        update: ReviewUpdate,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        update.validate()?;

        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .repository
            .get_review(&mut tx, review)
            .await?
            .filter(|current| current.user_uuid == author)
            .ok_or(ReviewsServiceError::NotFound)?;

        let product_listed = self.lock_product(&mut tx, current.product_uuid).await?;

        let updated = self
            .repository
            .update_review(&mut tx, review, update.rating, &update.comment)
            .await?;

        if product_listed {
            self.refresh_rating(&mut tx, current.product_uuid).await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_review(&self, actor: Actor, review: ReviewUuid) -> Result<(), ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.authored_review(&mut tx, actor, review).await?;

        let product_listed = self.lock_product(&mut tx, current.product_uuid).await?;

        if self.repository.delete_review(&mut tx, review).await? == 0 {
            return Err(ReviewsServiceError::NotFound);
        }

        if product_listed {
            self.refresh_rating(&mut tx, current.product_uuid).await?;
        }

        tx.commit().await?;

        info!(review_uuid = %review, by_admin = actor.is_admin(), "review deleted");

        Ok(())
    }

    async fn review_stats(&self, product: ProductUuid) -> Result<ReviewStats, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let counts = self.repository.rating_counts(&mut tx, product).await?;

        tx.commit().await?;

        Ok(ReviewStats::from_counts(&counts))
    }

    async fn review_eligibility(
        &self,
        author: UserUuid,
        product: ProductUuid,
    ) -> Result<ReviewEligibility, ReviewsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let existing_review = self
            .repository
            .find_user_review(&mut tx, product, author)
            .await?;
        let has_purchased = self
            .repository
            .has_delivered_purchase(&mut tx, author, product)
            .await?;

        tx.commit().await?;

        Ok(ReviewEligibility {
            existing_review,
            has_purchased,
        })
    }
}

#[automock]
#[async_trait]
pub trait ReviewsService: Send + Sync {
    /// Reviews an active product once per user. The review is marked as a
    /// verified purchase when the author has a delivered order containing it.
    /// Updates the product's rating and review count.
    async fn create_review(
        &self,
        author: UserUuid,
        review: NewReview,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// One page of a product's reviews, newest first.
    async fn list_reviews(
        &self,
        product: ProductUuid,
        page: PageRequest,
    ) -> Result<ReviewPage, ReviewsServiceError>;

    /// Replaces the rating and comment of the author's own review.
    async fn update_review(
        &self,
        author: UserUuid,
        review: ReviewUuid,
        update: ReviewUpdate,
    ) -> Result<ReviewRecord, ReviewsServiceError>;

    /// Deletes a review. Authors delete their own; admins delete any.
    async fn delete_review(&self, actor: Actor, review: ReviewUuid) -> Result<(), ReviewsServiceError>;

    /// Rating average and distribution for a product.
    async fn review_stats(&self, product: ProductUuid) -> Result<ReviewStats, ReviewsServiceError>;

    /// Whether `author` may still review `product`.
    async fn review_eligibility(
        &self,
        author: UserUuid,
        product: ProductUuid,
    ) -> Result<ReviewEligibility, ReviewsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::{OrdersService, data::StatusUpdate, status::OrderStatus},
            products::ProductsService,
        },
        test::{
            TestContext,
            helpers::{create_admin, create_customer, create_product, new_order, order_item},
        },
    };

    use super::*;

    fn new_review(product: ProductUuid, rating: u8) -> NewReview {
        NewReview {
            uuid: ReviewUuid::new(),
            product_uuid: product,
            rating,
            comment: "Paint job is spot on".to_string(),
        }
    }

    #[tokio::test]
    async fn reviews_aggregate_into_the_product_rating() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;
        let zoro = create_customer(&ctx).await?;
        let nami = create_customer(&ctx).await?;

        let first = ctx
            .reviews
            .create_review(zoro.uuid, new_review(product.uuid, 5))
            .await?;
        ctx.reviews
            .create_review(nami.uuid, new_review(product.uuid, 4))
            .await?;

        let rated = ctx.products.get_product(product.uuid).await?;

        assert_eq!(first.author_name, "Test User");
        assert!(!first.is_verified_purchase);
        assert_eq!(rated.rating_tenths, 45);
        assert_eq!(rated.num_reviews, 2);

        Ok(())
    }

    #[tokio::test]
    async fn second_review_by_the_same_user_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;
        let user = create_customer(&ctx).await?;

        ctx.reviews
            .create_review(user.uuid, new_review(product.uuid, 5))
            .await?;

        let result = ctx
            .reviews
            .create_review(user.uuid, new_review(product.uuid, 1))
            .await;

        assert!(
            matches!(result, Err(ReviewsServiceError::AlreadyReviewed)),
            "expected AlreadyReviewed, got {result:?}"
        );
        assert_eq!(ctx.products.get_product(product.uuid).await?.num_reviews, 1);

        Ok(())
    }

    #[tokio::test]
    async fn delivered_order_makes_the_review_verified() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;
        let user = create_customer(&ctx).await?;

        let order = ctx
            .orders
            .create_order(user.uuid, new_order(vec![order_item(product.uuid, 1)]))
            .await?;

        let before = ctx.reviews.review_eligibility(user.uuid, product.uuid).await?;

        ctx.orders
            .update_status(
                order.uuid,
                StatusUpdate {
                    status: OrderStatus::Delivered,
                    tracking_number: None,
                },
            )
            .await?;

        let after = ctx.reviews.review_eligibility(user.uuid, product.uuid).await?;
        let review = ctx
            .reviews
            .create_review(user.uuid, new_review(product.uuid, 5))
            .await?;
        let reviewed = ctx.reviews.review_eligibility(user.uuid, product.uuid).await?;

        assert!(!before.has_purchased);
        assert!(after.can_review() && after.has_purchased);
        assert!(review.is_verified_purchase);
        assert_eq!(reviewed.existing_review, Some(review.uuid));
        assert!(!reviewed.can_review());

        Ok(())
    }

    #[tokio::test]
    async fn deleted_product_cannot_be_reviewed() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;
        let user = create_customer(&ctx).await?;

        ctx.products.delete_product(product.uuid).await?;

        let result = ctx
            .reviews
            .create_review(user.uuid, new_review(product.uuid, 4))
            .await;

        assert!(
            matches!(result, Err(ReviewsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_recompute_the_rating() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;
        let author = create_customer(&ctx).await?;
        let other = create_customer(&ctx).await?;

        let review = ctx
            .reviews
            .create_review(author.uuid, new_review(product.uuid, 2))
            .await?;

        let updated = ctx
            .reviews
            .update_review(
                author.uuid,
                review.uuid,
                ReviewUpdate {
                    rating: 4,
                    comment: "Grew on me".to_string(),
                },
            )
            .await?;

        assert_eq!(updated.rating, 4);
        assert_eq!(ctx.products.get_product(product.uuid).await?.rating_tenths, 40);

        let stranger = ctx
            .reviews
            .update_review(
                other.uuid,
                review.uuid,
                ReviewUpdate {
                    rating: 1,
                    comment: "Not mine".to_string(),
                },
            )
            .await;

        assert!(
            matches!(stranger, Err(ReviewsServiceError::NotFound)),
            "expected NotFound, got {stranger:?}"
        );

        ctx.reviews.delete_review(author.actor(), review.uuid).await?;

        let cleared = ctx.products.get_product(product.uuid).await?;

        assert_eq!(cleared.rating_tenths, 0);
        assert_eq!(cleared.num_reviews, 0);

        Ok(())
    }

    #[tokio::test]
    async fn only_authors_and_admins_delete_reviews() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;
        let author = create_customer(&ctx).await?;
        let other = create_customer(&ctx).await?;
        let admin = create_admin(&ctx).await?;

        let review = ctx
            .reviews
            .create_review(author.uuid, new_review(product.uuid, 3))
            .await?;

        let result = ctx.reviews.delete_review(other.actor(), review.uuid).await;

        assert!(
            matches!(result, Err(ReviewsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
        ctx.reviews.delete_review(admin.actor(), review.uuid).await?;

        assert_eq!(ctx.reviews.review_stats(product.uuid).await?.total_reviews, 0);

        Ok(())
    }

    #[tokio::test]
    async fn reviews_are_paged_newest_first() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, 2_000, 5).await?;

        let mut written = Vec::new();

        for rating in 1..=3 {
            let user = create_customer(&ctx).await?;
            let review = ctx
                .reviews
                .create_review(user.uuid, new_review(product.uuid, rating))
                .await?;

            written.push(review.uuid);
        }

        let first = ctx
            .reviews
            .list_reviews(product.uuid, PageRequest::new(Some(1), Some(2)))
            .await?;
        let second = ctx
            .reviews
            .list_reviews(product.uuid, PageRequest::new(Some(2), Some(2)))
            .await?;

        let listed: Vec<ReviewUuid> = first
            .reviews
            .iter()
            .chain(&second.reviews)
            .map(|review| review.uuid)
            .collect();

        written.reverse();

        assert_eq!(listed, written);
        assert_eq!(first.total, 3);
        assert!(first.has_more());
        assert!(!second.has_more());

        let stats = ctx.reviews.review_stats(product.uuid).await?;

        assert_eq!(stats.distribution, [1, 1, 1, 0, 0]);
        assert_eq!(stats.rating_tenths, 20);

        Ok(())
    }
}
