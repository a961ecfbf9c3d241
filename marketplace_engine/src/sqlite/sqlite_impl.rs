//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::Migrator, SqlitePool};

use super::{
    db::{auth, carts, categories, db_url, new_pool, products, purchases, users},
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        Cart,
        CartItem,
        Category,
        NewCategory,
        NewProduct,
        NewProductImage,
        NewUser,
        Product,
        ProductImage,
        Purchase,
        Role,
        User,
        UserCredentials,
    },
    mkp_api::{
        account_objects::{DashboardStats, UserProfileUpdate},
        cart_objects::{CartLine, ClearCartOutcome},
        pagination::Pagination,
        product_objects::{ProductQueryFilter, ProductUpdate},
        purchase_objects::{NewPurchase, PurchaseLine, PurchaseQueryFilter},
    },
    traits::{
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
    },
};

static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `MKP_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date by running any outstanding embedded migrations.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        MIGRATOR.run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Closes every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser, roles: &[Role]) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let new_user = users::insert_user(&user, &mut tx).await?;
        auth::assign_roles(new_user.id, roles, &mut tx)
            .await
            .map_err(|e| AccountApiError::DatabaseError(e.to_string()))?;
        tx.commit().await?;
        Ok(new_user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_email(email, &mut conn).await
    }

    async fn fetch_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_credentials(email, &mut conn).await
    }

    async fn update_user_profile(&self, user_id: i64, update: UserProfileUpdate) -> Result<User, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::update_profile(user_id, update, &mut conn).await?.ok_or(AccountApiError::UserNotFound(user_id))
    }

    async fn fetch_dashboard_stats(&self, user_id: i64) -> Result<DashboardStats, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::dashboard_stats(user_id, &mut conn).await
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::roles_for_user(user_id, &mut conn).await
    }

    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::assign_roles(user_id, roles, &mut conn).await
    }

    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::remove_roles(user_id, roles, &mut conn).await
    }

    async fn revoke_token(&self, jti: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::revoke_token(jti, user_id, expires_at, &mut conn).await
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::is_token_revoked(jti, &mut conn).await
    }

    async fn purge_expired_tokens(&self) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::purge_expired_tokens(Utc::now(), &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        categories::fetch_categories(&mut conn).await
    }

    async fn fetch_category(&self, category_id: i64) -> Result<Option<Category>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        categories::fetch_category(category_id, &mut conn).await
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let id = categories::insert_category(&category, &mut conn).await?;
        categories::fetch_category(id, &mut conn)
            .await?
            .ok_or_else(|| CatalogError::DatabaseError(format!("Category #{id} vanished after insert")))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let id = products::insert_product(&product, &mut conn).await?;
        products::fetch_product(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await
    }

    async fn fetch_product_for_view(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut tx = self.pool.begin().await?;
        if !products::increment_view_count(product_id, &mut tx).await? {
            return Ok(None);
        }
        let product = products::fetch_product(product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        if !products::update_product(product_id, update, &mut conn).await? {
            return Ok(None);
        }
        products::fetch_product(product_id, &mut conn).await
    }

    async fn delete_product(&self, product_id: i64) -> Result<bool, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = products::delete_product(product_id, &mut conn).await?;
        if deleted {
            info!("🗃️ Product #{product_id} deleted");
        }
        Ok(deleted)
    }

    async fn search_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Product>, i64), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::search_products(&filter, pagination, &mut conn).await
    }

    async fn insert_product_image(
        &self,
        product_id: i64,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogError> {
        let mut tx = self.pool.begin().await?;
        if image.is_main {
            let n = products::clear_main_image(product_id, &mut tx).await?;
            trace!("🗃️ {n} main image(s) of product #{product_id} demoted");
        }
        let image = products::insert_product_image(product_id, &image, &mut tx).await?;
        tx.commit().await?;
        Ok(image)
    }

    async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product_images(product_id, &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_or_create_cart(user_id, &mut conn).await
    }

    async fn fetch_cart_lines(&self, cart_id: i64) -> Result<Vec<CartLine>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(cart_id, &mut conn).await?;
        let ids = items.iter().map(|i| i.product_id).collect::<Vec<i64>>();
        let mut products = products::fetch_products_by_ids(&ids, &mut conn)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(|p| (p.id, p))
            .collect::<HashMap<i64, Product>>();
        let lines = items
            .into_iter()
            .filter_map(|item| products.remove(&item.product_id).map(|p| CartLine::new(item, p)))
            .collect::<Result<Vec<CartLine>, _>>()?;
        Ok(lines)
    }

    async fn add_item_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        let mut tx = self.pool.begin().await?;
        // Write before reading: the transaction must hold the write lock before the availability check.
        let cart = carts::touch_cart(user_id, &mut tx).await?;
        let available =
            products::is_available(product_id, &mut tx).await.map_err(|e| CartError::DatabaseError(e.to_string()))?;
        if !available {
            debug!("🛒️ User #{user_id} tried to add unavailable product #{product_id} to their cart");
            return Err(CartError::ProductUnavailable(product_id));
        }
        let item = carts::upsert_cart_item(cart.id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn update_cart_item(
        &self,
        user_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        let mut tx = self.pool.begin().await?;
        let item = carts::update_item_quantity(user_id, item_id, quantity, &mut tx).await?;
        if item.is_some() {
            carts::touch_cart_of_user(user_id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, CartError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_item(user_id, item_id, &mut conn).await
    }

    async fn clear_cart(&self, user_id: i64) -> Result<ClearCartOutcome, CartError> {
        let mut conn = self.pool.acquire().await?;
        match carts::fetch_cart_for_user(user_id, &mut conn).await? {
            Some(cart) => {
                let n = carts::remove_all_items(cart.id, &mut conn).await?;
                Ok(ClearCartOutcome::Cleared(n))
            },
            None => Ok(ClearCartOutcome::NoCart),
        }
    }
}

impl PurchaseManagement for SqliteDatabase {
    async fn fetch_available_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_available_products(product_ids, &mut conn)
            .await
            .map_err(|e| CheckoutError::DatabaseError(e.to_string()))
    }

    async fn insert_purchase(&self, purchase: NewPurchase) -> Result<Purchase, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        // Claim every product before writing anything else. An early return drops `tx`, rolling everything back.
        for item in &purchase.items {
            let price = products::mark_sold_if_available(item.product_id, &mut tx)
                .await
                .map_err(|e| CheckoutError::DatabaseError(e.to_string()))?;
            match price {
                None => return Err(CheckoutError::ProductUnavailable(item.product_id)),
                Some(p) if p != item.unit_price => {
                    warn!(
                        "💳️ Price of product #{} changed from {} to {p} during checkout",
                        item.product_id, item.unit_price
                    );
                    return Err(CheckoutError::PriceChanged(item.product_id));
                },
                Some(_) => {},
            }
        }
        let record = purchases::insert_purchase(&purchase, &mut tx).await?;
        for item in &purchase.items {
            purchases::insert_purchase_item(record.id, item, &mut tx).await?;
        }
        if let Some(cart_id) = purchase.cart_id {
            let n = carts::clear_cart_for_user(cart_id, purchase.buyer_id, &mut tx)
                .await
                .map_err(|e| CheckoutError::DatabaseError(e.to_string()))?;
            debug!("💳️ {n} items removed from cart #{cart_id} after purchase {}", record.order_number);
        }
        tx.commit().await?;
        Ok(record)
    }

    async fn fetch_purchase(&self, purchase_id: i64) -> Result<Option<Purchase>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        purchases::fetch_purchase(purchase_id, &mut conn).await
    }

    async fn fetch_purchase_lines(&self, purchase_id: i64) -> Result<Vec<PurchaseLine>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let items = purchases::fetch_purchase_items(purchase_id, &mut conn).await?;
        let ids = items.iter().map(|i| i.product_id).collect::<Vec<i64>>();
        let mut products = products::fetch_products_by_ids(&ids, &mut conn)
            .await
            .map_err(|e| CheckoutError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(|p| (p.id, p))
            .collect::<HashMap<i64, Product>>();
        let lines = items
            .into_iter()
            .filter_map(|item| products.remove(&item.product_id).map(|p| PurchaseLine::new(item, p)))
            .collect::<Result<Vec<PurchaseLine>, _>>()?;
        Ok(lines)
    }

    async fn search_purchases(
        &self,
        filter: PurchaseQueryFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Purchase>, i64), CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        purchases::search_purchases(&filter, pagination, &mut conn).await
    }
}
