use mkp_common::Money;
use thiserror::Error;

use crate::{
    db_types::{Product, Purchase},
    helpers::ValidationErrors,
    mkp_api::{
        pagination::{InvalidPage, Pagination},
        purchase_objects::{NewPurchase, PurchaseLine, PurchaseQueryFilter},
    },
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid purchase data. {0}")]
    ValidationError(ValidationErrors),
    #[error("Product {0} not found or already sold")]
    ProductUnavailable(i64),
    #[error("The price of product {0} changed during checkout")]
    PriceChanged(i64),
    #[error("Total amount mismatch")]
    TotalMismatch { declared: Money, computed: Money },
    #[error("Purchase {0} not found")]
    PurchaseNotFound(i64),
    #[error("Invalid page.")]
    InvalidPage,
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

impl From<ValidationErrors> for CheckoutError {
    fn from(e: ValidationErrors) -> Self {
        CheckoutError::ValidationError(e)
    }
}

impl From<InvalidPage> for CheckoutError {
    fn from(_: InvalidPage) -> Self {
        CheckoutError::InvalidPage
    }
}

/// The `PurchaseManagement` trait defines behaviour for recording and querying purchases.
#[allow(async_fn_in_trait)]
pub trait PurchaseManagement {
    /// Fetches those of the given products that exist and are not yet sold.
    async fn fetch_available_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, CheckoutError>;

    /// Records a purchase in a single atomic transaction:
    /// * every product in the purchase is marked as sold, provided it is still unsold and still has the price the
    ///   purchase was priced with. Otherwise the transaction is rolled back and
    ///   [`CheckoutError::ProductUnavailable`] or [`CheckoutError::PriceChanged`] is returned.
    /// * the purchase and its items are inserted, with each item's price frozen.
    /// * if a cart id is given and the cart belongs to the buyer, the cart is emptied. Otherwise it is left alone.
    async fn insert_purchase(&self, purchase: NewPurchase) -> Result<Purchase, CheckoutError>;

    async fn fetch_purchase(&self, purchase_id: i64) -> Result<Option<Purchase>, CheckoutError>;

    /// The items of the purchase, each with its product.
    async fn fetch_purchase_lines(&self, purchase_id: i64) -> Result<Vec<PurchaseLine>, CheckoutError>;

    /// Fetches one page of purchases matching the filter, newest first, along with the total number of matches.
    async fn search_purchases(
        &self,
        filter: PurchaseQueryFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Purchase>, i64), CheckoutError>;
}
