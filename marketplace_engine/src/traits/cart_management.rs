use thiserror::Error;

use crate::{
    db_types::{Cart, CartItem},
    helpers::ValidationErrors,
    mkp_api::cart_objects::{CartLine, ClearCartOutcome},
};

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} not found or already sold")]
    ProductUnavailable(i64),
    #[error("Cart item {0} not found")]
    ItemNotFound(i64),
    #[error("Invalid cart data. {0}")]
    ValidationError(ValidationErrors),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

impl From<ValidationErrors> for CartError {
    fn from(e: ValidationErrors) -> Self {
        CartError::ValidationError(e)
    }
}

/// The `CartManagement` trait defines behaviour for the per-user shopping cart.
///
/// Every operation is scoped to a user. An item id that exists but belongs to someone else's cart is treated exactly
/// like an item id that does not exist.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Fetches the user's cart, creating an empty one if they do not have one yet.
    async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartError>;

    /// The items in the cart, each with its product, in the order they were added.
    async fn fetch_cart_lines(&self, cart_id: i64) -> Result<Vec<CartLine>, CartError>;

    /// Adds `quantity` units of the product to the user's cart, creating the cart if needed. If the product is already
    /// in the cart the quantity is incremented rather than replaced. Fails with [`CartError::ProductUnavailable`] if
    /// the product does not exist or has been sold.
    async fn add_item_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartError>;

    /// Replaces the quantity of an item in the user's cart. Returns `None` if the user has no such item.
    async fn update_cart_item(
        &self,
        user_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError>;

    /// Removes an item from the user's cart. Returns `false` if the user has no such item.
    async fn remove_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, CartError>;

    async fn clear_cart(&self, user_id: i64) -> Result<ClearCartOutcome, CartError>;
}
