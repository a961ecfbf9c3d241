use chrono::{DateTime, Utc};
use marketplace_engine::{
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
use mockall::mock;

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn create_user(&self, user: NewUser, roles: &[Role]) -> Result<User, AccountApiError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
        async fn fetch_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AccountApiError>;
        async fn update_user_profile(&self, user_id: i64, update: UserProfileUpdate) -> Result<User, AccountApiError>;
        async fn fetch_dashboard_stats(&self, user_id: i64) -> Result<DashboardStats, AccountApiError>;
    }
}

mock! {
    pub AuthManager {}
    impl AccountManagement for AuthManager {
        async fn create_user(&self, user: NewUser, roles: &[Role]) -> Result<User, AccountApiError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
        async fn fetch_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AccountApiError>;
        async fn update_user_profile(&self, user_id: i64, update: UserProfileUpdate) -> Result<User, AccountApiError>;
        async fn fetch_dashboard_stats(&self, user_id: i64) -> Result<DashboardStats, AccountApiError>;
    }
    impl AuthManagement for AuthManager {
        async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;
        async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;
        async fn revoke_token(&self, jti: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<(), AuthApiError>;
        async fn is_token_revoked(&self, jti: &str) -> Result<bool, AuthApiError>;
        async fn purge_expired_tokens(&self) -> Result<u64, AuthApiError>;
    }
}

mock! {
    pub CatalogManager {}
    impl CatalogManagement for CatalogManager {
        async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError>;
        async fn fetch_category(&self, category_id: i64) -> Result<Option<Category>, CatalogError>;
        async fn insert_category(&self, category: NewCategory) -> Result<Category, CatalogError>;
        async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;
        async fn fetch_product_for_view(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;
        async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogError>;
        async fn delete_product(&self, product_id: i64) -> Result<bool, CatalogError>;
        async fn search_products(&self, filter: ProductQueryFilter, pagination: Pagination) -> Result<(Vec<Product>, i64), CatalogError>;
        async fn insert_product_image(&self, product_id: i64, image: NewProductImage) -> Result<ProductImage, CatalogError>;
        async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError>;
    }
}

mock! {
    pub CartManager {}
    impl CartManagement for CartManager {
        async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartError>;
        async fn fetch_cart_lines(&self, cart_id: i64) -> Result<Vec<CartLine>, CartError>;
        async fn add_item_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartError>;
        async fn update_cart_item(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<Option<CartItem>, CartError>;
        async fn remove_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, CartError>;
        async fn clear_cart(&self, user_id: i64) -> Result<ClearCartOutcome, CartError>;
    }
}

mock! {
    pub PurchaseManager {}
    impl PurchaseManagement for PurchaseManager {
        async fn fetch_available_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, CheckoutError>;
        async fn insert_purchase(&self, purchase: NewPurchase) -> Result<Purchase, CheckoutError>;
        async fn fetch_purchase(&self, purchase_id: i64) -> Result<Option<Purchase>, CheckoutError>;
        async fn fetch_purchase_lines(&self, purchase_id: i64) -> Result<Vec<PurchaseLine>, CheckoutError>;
        async fn search_purchases(&self, filter: PurchaseQueryFilter, pagination: Pagination) -> Result<(Vec<Purchase>, i64), CheckoutError>;
    }
}
