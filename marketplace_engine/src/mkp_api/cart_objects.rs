use chrono::{DateTime, Utc};
use mkp_common::Money;
use serde::Serialize;

use crate::{
    db_types::{Cart, CartItem, Product},
    helpers::ValidationErrors,
};

/// A cart item along with a snapshot of the product it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub id: i64,
    pub product: Product,
    pub quantity: i64,
    pub total_price: Money,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Fails if the line total at the current price does not fit in a [`Money`].
    pub fn new(item: CartItem, product: Product) -> Result<Self, ValidationErrors> {
        let total_price = product
            .price
            .checked_mul(item.quantity)
            .ok_or_else(|| ValidationErrors::single("items", format!("The total for product {} is too large.", product.id)))?;
        Ok(Self { id: item.id, product, quantity: item.quantity, total_price, added_at: item.added_at })
    }
}

/// The contents of a user's cart. The totals are derived from current product prices every time a view is built and
/// are never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub total_price: Money,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    pub fn new(cart: Cart, items: Vec<CartLine>) -> Result<Self, ValidationErrors> {
        let too_large = || ValidationErrors::single("items", "The cart total is too large.");
        let total_items = items.iter().try_fold(0i64, |acc, l| acc.checked_add(l.quantity)).ok_or_else(too_large)?;
        let total_price = Money::checked_sum(items.iter().map(|l| l.total_price)).ok_or_else(too_large)?;
        Ok(Self { id: cart.id, user_id: cart.user_id, items, total_items, total_price, updated_at: cart.updated_at })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearCartOutcome {
    /// The user's cart existed and this many items were removed from it.
    Cleared(u64),
    /// The user has never had a cart.
    NoCart,
}
