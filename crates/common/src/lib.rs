//! Shopfront Common Library
//!
//! Shared types, error taxonomy, and the SQLite-backed store used by the
//! storefront backend and the test harness.

pub mod db;
pub mod error;
pub mod types;

pub use db::{Database, ProductPage, ProductSort};
pub use error::{Error, Result};
pub use types::*;

/// Shopfront version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
