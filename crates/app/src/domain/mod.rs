//! Storefront Domain Concerns

pub mod carts;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod products;
pub mod reviews;
pub mod users;
