//! Storefront domain services, persistence and bearer-token auth.
//!
//! The HTTP layer talks to this crate only through [`context::AppContext`].

pub mod auth;
pub mod context;
pub mod database;
pub mod domain;

#[cfg(test)]
mod test;

mod uuids;
