//! Reviews Data

use crate::domain::{
    products::records::ProductUuid,
    reviews::{
        errors::ReviewsServiceError,
        records::{ReviewRecord, ReviewUuid},
    },
};

pub const MAX_COMMENT_CHARS: usize = 1_000;

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 50;

/// New Review Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub uuid: ReviewUuid,
    pub product_uuid: ProductUuid,
    pub rating: u8,
    pub comment: String,
}

/// Review Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewUpdate {
    pub rating: u8,
    pub comment: String,
}

pub(crate) fn validate_review(rating: u8, comment: &str) -> Result<(), ReviewsServiceError> {
    if !(1..=5).contains(&rating) {
        return Err(ReviewsServiceError::InvalidRating);
    }

    let comment = comment.trim();

    if comment.is_empty() {
        return Err(ReviewsServiceError::MissingRequiredData);
    }

    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(ReviewsServiceError::CommentTooLong);
    }

    Ok(())
}

impl NewReview {
    pub(crate) fn validate(&self) -> Result<(), ReviewsServiceError> {
        validate_review(self.rating, &self.comment)
    }
}

impl ReviewUpdate {
    pub(crate) fn validate(&self) -> Result<(), ReviewsServiceError> {
        validate_review(self.rating, &self.comment)
    }
}

/// Which page of a listing to read. Out of range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn per_page(self) -> u32 {
        self.per_page
    }

    pub(crate) fn offset(self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a product's reviews, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewRecord>,
    pub page: PageRequest,
    pub total: u64,
}

impl ReviewPage {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page.per_page()))
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.page.page()) < self.total_pages()
    }
}

/// Aggregate of a product's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewStats {
    /// Average rating in tenths of a star, rounded half up
    pub rating_tenths: u16,
    pub total_reviews: u32,
    /// Review counts for one to five stars, in that order
    pub distribution: [u32; 5],
}

impl ReviewStats {
    /// Build from `(stars, reviews)` pairs. Pairs outside one to five stars
    /// are ignored.
    #[must_use]
    pub fn from_counts(counts: &[(u8, u32)]) -> Self {
        let mut distribution = [0_u32; 5];

        for &(stars, reviews) in counts {
            if let Some(slot) = usize::from(stars)
                .checked_sub(1)
                .and_then(|index| distribution.get_mut(index))
            {
                *slot = slot.saturating_add(reviews);
            }
        }

        let total = distribution.iter().fold(0_u32, |sum, &n| sum.saturating_add(n));
        let points: u64 = distribution
            .iter()
            .zip(1_u64..)
            .map(|(&reviews, stars)| u64::from(reviews) * stars)
            .sum();

        let rating_tenths = if total == 0 {
            0
        } else {
            let total = u64::from(total);

            u16::try_from((points * 20 + total) / (total * 2)).unwrap_or(50)
        };

        Self {
            rating_tenths,
            total_reviews: total,
            distribution,
        }
    }

    /// Reviews with exactly `stars` stars.
    #[must_use]
    pub fn count_for(&self, stars: u8) -> u32 {
        usize::from(stars)
            .checked_sub(1)
            .and_then(|index| self.distribution.get(index))
            .copied()
            .unwrap_or(0)
    }
}

/// Whether a user may review a product, and whether it would be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewEligibility {
    pub existing_review: Option<ReviewUuid>,
    pub has_purchased: bool,
}

impl ReviewEligibility {
    #[must_use]
    pub fn can_review(&self) -> bool {
        self.existing_review.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_outside_one_to_five_is_rejected() {
        for rating in [0, 6] {
            assert!(matches!(
                validate_review(rating, "Great figure"),
                Err(ReviewsServiceError::InvalidRating)
            ));
        }

        assert!(validate_review(5, "Great figure").is_ok());
    }

    #[test]
    fn comment_must_be_present_and_bounded() {
        assert!(matches!(
            validate_review(4, "  "),
            Err(ReviewsServiceError::MissingRequiredData)
        ));
        assert!(matches!(
            validate_review(4, &"a".repeat(MAX_COMMENT_CHARS + 1)),
            Err(ReviewsServiceError::CommentTooLong)
        ));
        assert!(validate_review(4, &"é".repeat(MAX_COMMENT_CHARS)).is_ok());
    }

    #[test]
    fn average_rounds_half_up_to_tenths() {
        let stats = ReviewStats::from_counts(&[(5, 1), (4, 1)]);

        assert_eq!(stats.rating_tenths, 45);
        assert_eq!(stats.total_reviews, 2);

        assert_eq!(ReviewStats::from_counts(&[(5, 2), (4, 1)]).rating_tenths, 47);
        assert_eq!(ReviewStats::from_counts(&[(5, 1), (4, 2)]).rating_tenths, 43);
        assert_eq!(ReviewStats::from_counts(&[(1, 7)]).rating_tenths, 10);
    }

    #[test]
    fn no_reviews_is_zero() {
        let stats = ReviewStats::from_counts(&[]);

        assert_eq!(stats, ReviewStats::default());
        assert_eq!(stats.count_for(5), 0);
    }

    #[test]
    fn distribution_is_indexed_by_stars() {
        let stats = ReviewStats::from_counts(&[(1, 2), (5, 3), (9, 4)]);

        assert_eq!(stats.distribution, [2, 0, 0, 0, 3]);
        assert_eq!(stats.count_for(5), 3);
        assert_eq!(stats.count_for(0), 0);
        assert_eq!(stats.total_reviews, 5);
    }

    #[test]
    fn pages_are_clamped() {
        let page = PageRequest::new(Some(0), Some(500));

        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), 50);
        assert_eq!(page.offset(), 0);
        assert_eq!(PageRequest::new(Some(3), None).offset(), 20);
    }

    #[test]
    fn page_counts_round_up() {
        let page = ReviewPage {
            reviews: Vec::new(),
            page: PageRequest::new(Some(2), Some(10)),
            total: 21,
        };

        assert_eq!(page.total_pages(), 3);
        assert!(page.has_more());
    }
}
