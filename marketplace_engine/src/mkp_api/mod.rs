//! # Marketplace engine public API
//!
//! The `mkp_api` module exposes the programmatic API for the marketplace engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`auth_api`] registers users, checks credentials, and manages roles and revoked tokens.
//! * [`accounts_api`] reads and edits user profiles, and builds the user dashboard.
//! * [`catalog_api`] manages categories, product listings and product images, and answers product searches.
//! * [`cart_api`] manages each user's shopping cart.
//! * [`checkout_api`] turns line items into purchases and answers purchase history queries.
//!
//! The other submodules in this module are support and utility types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use marketplace_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db);
//! let item = api.add_item(user_id, product_id, 2).await?;
//! ```

pub mod account_objects;
pub mod accounts_api;
pub mod auth_api;
pub mod cart_api;
pub mod cart_objects;
pub mod catalog_api;
pub mod checkout_api;
pub mod pagination;
pub mod product_objects;
pub mod purchase_objects;
