//! Marketplace Engine
//!
//! The marketplace engine holds the business logic and storage for a second-hand goods marketplace: user accounts,
//! the product catalogue, shopping carts and checkout. It knows nothing about HTTP; the server crate wraps it.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]). A storage backend implements these traits to act as the store for the
//!    engine. SQLite is the supported backend ([`SqliteDatabase`]). The data types that are read from and written to
//!    the store are defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@mkp_api`]). This provides the public-facing functionality of the engine: registration and
//!    roles, profiles, listings and search, carts, and checkout. Each API object is generic over the backend traits it
//!    needs.
//! 3. Stateless helpers ([`mod@helpers`]) for validation, password hashing, slugs and order numbers.
pub mod db_types;
pub mod helpers;
pub mod mkp_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase, SqliteDatabaseError};
pub use mkp_api::{
    accounts_api::AccountApi,
    auth_api::AuthApi,
    cart_api::CartApi,
    catalog_api::CatalogApi,
    checkout_api::CheckoutApi,
};
pub use traits::{
    AccountApiError,
    AccountManagement,
    AuthApiError,
    AuthManagement,
    CartError,
    CartManagement,
    CatalogError,
    CatalogManagement,
    CheckoutError,
    PurchaseManagement,
};
