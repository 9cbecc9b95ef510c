//! Shopfront Web Backend
//!
//! REST API for the storefront: authentication and the product catalog.
//! The router is built as a pure function of an existing database handle so
//! tests can inject requests without binding a socket.

pub mod auth;
pub mod server;

pub use auth::AuthService;
pub use server::{build_app, serve, AppState};
