//! Product Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Clothing,
    Figures,
    Posters,
    Accessories,
    Manga,
    Other,
}

impl Category {
    pub const ALL: [Self; 6] = [
        Self::Clothing,
        Self::Figures,
        Self::Posters,
        Self::Accessories,
        Self::Manga,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clothing => "clothing",
            Self::Figures => "figures",
            Self::Posters => "posters",
            Self::Accessories => "accessories",
            Self::Manga => "manga",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Garment sizes a listing may offer.
pub const SIZES: [&str; 8] = ["XS", "S", "M", "L", "XL", "XXL", "One Size", "X"];

/// Product Record
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub anime_series: String,
    pub image: Option<String>,
    pub price: u64,
    pub discount_price: Option<u64>,
    pub stock: u32,
    pub sold: u32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub is_featured: bool,
    /// Average review rating in tenths of a star, 0 without reviews
    pub rating_tenths: u16,
    pub num_reviews: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl ProductRecord {
    /// Discount price when present, else the list price.
    #[must_use]
    pub fn effective_price(&self) -> u64 {
        self.discount_price.unwrap_or(self.price)
    }

    /// Average rating to one decimal place, e.g. `4.5`.
    #[must_use]
    pub fn rating(&self) -> f64 {
        f64::from(self.rating_tenths) / 10.0
    }
}
