//! Products Data

use crate::domain::products::{
    errors::ProductsServiceError,
    records::{Category, ProductUuid, SIZES},
};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub anime_series: String,
    pub image: Option<String>,
    pub price: u64,
    pub discount_price: Option<u64>,
    pub stock: u32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub is_featured: bool,
}

/// Product Update Data
///
/// Replaces every editable field; stock is set absolutely. `sold` and the
/// review aggregates are never written by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub anime_series: String,
    pub image: Option<String>,
    pub price: u64,
    pub discount_price: Option<u64>,
    pub stock: u32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub is_featured: bool,
}

/// Catalog listing filter. Every present criterion must match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductFilter {
    pub category: Option<Category>,
    /// Exact series name, ignoring case
    pub anime_series: Option<String>,
    pub featured: Option<bool>,
    /// Substring of the name, description, series or a tag
    pub search: Option<String>,
}

impl ProductFilter {
    /// `ILIKE` pattern for [`Self::search`], with wildcards in the term escaped.
    pub(crate) fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())?;

        let mut pattern = String::with_capacity(term.len() + 2);

        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');

        Some(pattern)
    }

    pub(crate) fn anime_series(&self) -> Option<&str> {
        self.anime_series
            .as_deref()
            .map(str::trim)
            .filter(|series| !series.is_empty())
    }
}

pub(crate) fn validate_listing(
    name: &str,
    price: u64,
    discount_price: Option<u64>,
) -> Result<(), ProductsServiceError> {
    if name.trim().is_empty() {
        return Err(ProductsServiceError::MissingRequiredData);
    }

    if price == 0 {
        return Err(ProductsServiceError::InvalidData);
    }

    match discount_price {
        Some(discount) if discount == 0 || discount >= price => {
            Err(ProductsServiceError::InvalidDiscount)
        }
        _ => Ok(()),
    }
}

pub(crate) fn validate_attributes(
    anime_series: &str,
    sizes: &[String],
) -> Result<(), ProductsServiceError> {
    if anime_series.trim().is_empty() {
        return Err(ProductsServiceError::MissingRequiredData);
    }

    match sizes.iter().find(|size| !SIZES.contains(&size.as_str())) {
        Some(size) => Err(ProductsServiceError::UnknownSize(size.clone())),
        None => Ok(()),
    }
}

impl NewProduct {
    pub(crate) fn validate(&self) -> Result<(), ProductsServiceError> {
        validate_listing(&self.name, self.price, self.discount_price)?;
        validate_attributes(&self.anime_series, &self.sizes)
    }
}

impl ProductUpdate {
    pub(crate) fn validate(&self) -> Result<(), ProductsServiceError> {
        validate_listing(&self.name, self.price, self.discount_price)?;
        validate_attributes(&self.anime_series, &self.sizes)
    }
}
