//! The shopping cart.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::CartItem,
    helpers::{ValidationErrors, MAX_QUANTITY, MAX_QUANTITY_MESSAGE},
    mkp_api::cart_objects::{CartView, ClearCartOutcome},
    traits::{CartError, CartManagement},
};

/// `CartApi` manages each user's shopping cart. A user's cart is created the first time it is needed.
pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's cart with each item's product, and totals computed from current prices.
    pub async fn view(&self, user_id: i64) -> Result<CartView, CartError> {
        let cart = self.db.fetch_or_create_cart(user_id).await?;
        let lines = self.db.fetch_cart_lines(cart.id).await?;
        let view = CartView::new(cart, lines)?;
        trace!("🛒️ Cart #{} of user #{user_id}: {} items, {}", view.id, view.total_items, view.total_price);
        Ok(view)
    }

    /// Adds the product to the cart. Adding a product that is already in the cart increases its quantity.
    pub async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        check_quantity(quantity)?;
        let item = self.db.add_item_to_cart(user_id, product_id, quantity).await?;
        debug!("🛒️ User #{user_id} added {quantity} of product #{product_id}. Cart item #{} now has {}", item.id, item.quantity);
        Ok(item)
    }

    /// Sets the quantity of an item in the user's cart.
    pub async fn update_item(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        check_quantity(quantity)?;
        self.db.update_cart_item(user_id, item_id, quantity).await?.ok_or(CartError::ItemNotFound(item_id))
    }

    pub async fn remove_item(&self, user_id: i64, item_id: i64) -> Result<(), CartError> {
        if self.db.remove_cart_item(user_id, item_id).await? {
            debug!("🛒️ Item #{item_id} removed from the cart of user #{user_id}");
            Ok(())
        } else {
            Err(CartError::ItemNotFound(item_id))
        }
    }

    /// Empties the user's cart. A user without a cart is not an error.
    pub async fn clear(&self, user_id: i64) -> Result<ClearCartOutcome, CartError> {
        let outcome = self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cart of user #{user_id} cleared: {outcome:?}");
        Ok(outcome)
    }
}

fn check_quantity(quantity: i64) -> Result<(), ValidationErrors> {
    if quantity < 1 {
        return Err(ValidationErrors::single("quantity", "Ensure this value is greater than or equal to 1."));
    }
    if quantity > MAX_QUANTITY {
        return Err(ValidationErrors::single("quantity", MAX_QUANTITY_MESSAGE));
    }
    Ok(())
}
