//! # Backend interface contracts
//!
//! This module defines the traits that a storage backend must implement to act as the store for the marketplace
//! engine. The public API objects in [`crate::mkp_api`] are generic over these traits, so the same business logic
//! runs against SQLite in production and against mocks in tests.
//!
//! * [`AccountManagement`] creates users and reads and updates their profiles.
//! * [`AuthManagement`] manages user roles and the refresh token blacklist.
//! * [`CatalogManagement`] stores categories, products and product images, and answers product queries.
//! * [`CartManagement`] maintains each user's shopping cart.
//! * [`PurchaseManagement`] records purchases atomically and answers purchase history queries.
mod account_management;
mod auth_management;
mod cart_management;
mod catalog_management;
mod purchase_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use auth_management::{AuthApiError, AuthManagement};
pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use purchase_management::{CheckoutError, PurchaseManagement};
