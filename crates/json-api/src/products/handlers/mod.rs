//! Product Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::products::records::{Category, ProductRecord};

use crate::errors::ApiError;

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod featured;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductResponse {
    /// The unique identifier of the product
    pub uuid: Uuid,

    pub name: String,

    pub description: String,

    /// One of clothing, figures, posters, accessories, manga, other
    pub category: String,

    pub anime_series: String,

    pub image: Option<String>,

    /// List price in minor units
    pub price: u64,

    /// Discounted price in minor units, when on sale
    pub discount_price: Option<u64>,

    /// The price charged at checkout
    pub effective_price: u64,

    pub stock: u32,

    pub sold: u32,

    pub sizes: Vec<String>,

    pub colors: Vec<String>,

    pub tags: Vec<String>,

    pub is_featured: bool,

    /// Average review rating to one decimal place
    pub rating: f64,

    pub num_reviews: u32,

    /// The date and time the product was created
    pub created_at: String,

    /// The date and time the product was last updated
    pub updated_at: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        ProductResponse {
            uuid: product.uuid.into(),
            effective_price: product.effective_price(),
            rating: product.rating(),
            name: product.name,
            description: product.description,
            category: product.category.to_string(),
            anime_series: product.anime_series,
            image: product.image,
            price: product.price,
            discount_price: product.discount_price,
            stock: product.stock,
            sold: product.sold,
            sizes: product.sizes,
            colors: product.colors,
            tags: product.tags,
            is_featured: product.is_featured,
            num_reviews: product.num_reviews,
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
        }
    }
}

/// Single Product Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductEnvelope {
    pub success: bool,
    pub product: ProductResponse,
}

impl From<ProductRecord> for ProductEnvelope {
    fn from(product: ProductRecord) -> Self {
        Self {
            success: true,
            product: product.into(),
        }
    }
}

pub(super) fn parse_category(value: &str) -> Result<Category, ApiError> {
    value
        .parse()
        .map_err(|error| ApiError::bad_request("Invalid category").with_detail(error))
}
