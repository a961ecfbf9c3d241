use thiserror::Error;

use crate::{
    db_types::{Category, NewCategory, NewProduct, NewProductImage, Product, ProductImage},
    helpers::ValidationErrors,
    mkp_api::{
        pagination::{InvalidPage, Pagination},
        product_objects::{ProductQueryFilter, ProductUpdate},
    },
};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} not found")]
    ProductNotFound(i64),
    #[error("User {user_id} is not the seller of product {product_id}")]
    NotProductOwner { user_id: i64, product_id: i64 },
    #[error("Invalid catalog data. {0}")]
    ValidationError(ValidationErrors),
    #[error("Invalid page.")]
    InvalidPage,
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(e: ValidationErrors) -> Self {
        CatalogError::ValidationError(e)
    }
}

impl From<InvalidPage> for CatalogError {
    fn from(_: InvalidPage) -> Self {
        CatalogError::InvalidPage
    }
}

/// The `CatalogManagement` trait defines behaviour for storing and querying categories, products and product
/// images.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// All categories, ordered by name, each with the number of products listed in it.
    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError>;

    async fn fetch_category(&self, category_id: i64) -> Result<Option<Category>, CatalogError>;

    /// Inserts a new category. A duplicate name or slug results in a [`CatalogError::ValidationError`].
    async fn insert_category(&self, category: NewCategory) -> Result<Category, CatalogError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    /// Fetches a product without touching its view counter.
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    /// Increments the product's view counter and returns the updated product, or `None` if it does not exist.
    async fn fetch_product_for_view(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    /// Applies a partial update to the product. Returns `None` if the product does not exist.
    async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogError>;

    /// Deletes the product along with its images and any cart items that refer to it. Returns `false` if the product
    /// did not exist.
    async fn delete_product(&self, product_id: i64) -> Result<bool, CatalogError>;

    /// Fetches one page of products matching the filter, along with the total number of matching products.
    async fn search_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Product>, i64), CatalogError>;

    /// Adds an image to the product. If the image is flagged as the main image, every other image of the product is
    /// un-flagged in the same transaction.
    async fn insert_product_image(
        &self,
        product_id: i64,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogError>;

    /// The product's images, main image first, then by sort order.
    async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError>;
}
