use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cart, CartItem},
    helpers::{ValidationErrors, MAX_QUANTITY, MAX_QUANTITY_MESSAGE},
    traits::CartError,
};

pub async fn fetch_cart_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, CartError> {
    let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(cart)
}

/// Creates the user's cart if it does not exist yet. Existing carts are left as they are.
pub async fn fetch_or_create_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Cart, CartError> {
    let inserted = sqlx::query("INSERT INTO carts (user_id) VALUES (?) ON CONFLICT(user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if inserted.rows_affected() > 0 {
        debug!("🛒️ New cart created for user #{user_id}");
    }
    let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = ?").bind(user_id).fetch_one(conn).await?;
    Ok(cart)
}

/// Creates the user's cart if needed, and bumps its `updated_at` timestamp.
pub async fn touch_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Cart, CartError> {
    let cart = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (user_id) VALUES (?) ON CONFLICT(user_id) DO UPDATE SET updated_at = CURRENT_TIMESTAMP \
         RETURNING *",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(cart)
}

pub async fn fetch_cart_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, CartError> {
    let items = sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = ? ORDER BY added_at, id")
        .bind(cart_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Inserts the product into the cart, or increments its quantity if it is already there.
///
/// Fails with a validation error if the new quantity would exceed [`MAX_QUANTITY`]. The item is left unchanged.
pub async fn upsert_cart_item(
    cart_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, CartError> {
    let item = sqlx::query_as::<_, CartItem>(
        r#"INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?, ?, ?)
        ON CONFLICT(cart_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity
        WHERE quantity <= ? - excluded.quantity
        RETURNING *"#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(MAX_QUANTITY)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ValidationErrors::single("quantity", MAX_QUANTITY_MESSAGE))?;
    trace!("🛒️ Cart #{cart_id} now holds {} of product #{product_id}", item.quantity);
    Ok(item)
}

/// Sets the quantity of an item, provided the item is in the user's cart.
pub async fn update_item_quantity(
    user_id: i64,
    item_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, CartError> {
    let item = sqlx::query_as::<_, CartItem>(
        "UPDATE cart_items SET quantity = ? WHERE id = ? AND cart_id IN (SELECT id FROM carts WHERE user_id = ?) \
         RETURNING *",
    )
    .bind(quantity)
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

/// Removes an item, provided it is in the user's cart.
pub async fn remove_item(user_id: i64, item_id: i64, conn: &mut SqliteConnection) -> Result<bool, CartError> {
    let result =
        sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id IN (SELECT id FROM carts WHERE user_id = ?)")
            .bind(item_id)
            .bind(user_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_all_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<u64, CartError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?").bind(cart_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Empties the cart with the given id, but only if it belongs to the user. Returns the number of items removed,
/// which is zero for somebody else's cart or a cart that does not exist.
pub async fn clear_cart_for_user(cart_id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<u64, CartError> {
    let result = sqlx::query(
        "DELETE FROM cart_items WHERE cart_id = ? AND cart_id IN (SELECT id FROM carts WHERE user_id = ?)",
    )
    .bind(cart_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn touch_cart_of_user(user_id: i64, conn: &mut SqliteConnection) -> Result<(), CartError> {
    sqlx::query("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE user_id = ?").bind(user_id).execute(conn).await?;
    Ok(())
}
