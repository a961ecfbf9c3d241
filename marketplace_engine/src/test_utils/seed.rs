//! Shortcuts for populating a test database.
use mkp_common::Money;

use crate::{
    db_types::{NewProduct, NewUser, Product, Role, User},
    helpers::hash_password,
    AccountManagement,
    CatalogManagement,
    SqliteDatabase,
};

pub const SEED_PASSWORD: &str = "correct-horse-battery";

/// Creates a user called `username` with the address `{username}@example.com` and the password [`SEED_PASSWORD`].
pub async fn seed_user(db: &SqliteDatabase, username: &str) -> User {
    let password_hash = hash_password(SEED_PASSWORD).expect("Error hashing password");
    let user = NewUser {
        email: format!("{username}@example.com"),
        username: username.to_string(),
        password_hash,
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
    };
    db.create_user(user, &[Role::User]).await.expect("Error creating user")
}

/// Lists a product for `seller_id` in the Electronics category.
pub async fn seed_product(db: &SqliteDatabase, seller_id: i64, title: &str, price_cents: i64) -> Product {
    let category_id = db
        .fetch_categories()
        .await
        .expect("Error fetching categories")
        .into_iter()
        .find(|c| c.slug == "electronics")
        .map(|c| c.id)
        .expect("Default categories are missing");
    let product = NewProduct {
        title: title.to_string(),
        description: format!("A gently used {title}"),
        category_id,
        price: Money::from_cents(price_cents),
        quantity: 1,
        location: "Cape Town".to_string(),
        seller_id,
        ..Default::default()
    };
    db.insert_product(product).await.expect("Error creating product")
}
