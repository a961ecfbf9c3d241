//! SQLite backend for the marketplace engine.
//!
//! [`SqliteDatabase`] implements every backend trait in [`crate::traits`]. The low-level queries live in [`db`] as
//! free functions over a `&mut SqliteConnection`, so that they can be composed into transactions. The schema is
//! embedded from the `migrations` directory and applied with [`SqliteDatabase::migrate`].
mod errors;
mod sqlite_impl;

pub mod db;
pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;
