//! Request and response bodies for the REST API.
//!
//! Engine types are converted into response objects here so that the JSON shape of the API is decoupled from the
//! storage layout. Query strings are deserialized into the `*Query` structs with every field as an optional string,
//! and converted into engine filters with per-field validation errors.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use marketplace_engine::{
    db_types::{Category, Product, ProductCondition, ProductImage, PurchaseStatus, Role, Roles, User},
    helpers::ValidationErrors,
    mkp_api::{
        account_objects::{Dashboard, DashboardStats, UserWithRoles},
        cart_objects::{CartLine, CartView},
        pagination::{Page, Pagination},
        product_objects::{FiltersApplied, ListingStatus, ProductQueryFilter, SortOrder},
        purchase_objects::{PurchaseDetail, PurchaseLine, PurchaseQueryFilter},
    },
};
use mkp_common::Money;
use serde::{Deserialize, Serialize};

use crate::{auth::TokenPair, errors::ServerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub message: String,
}

impl JsonResponse {
    pub fn new<S: Display>(message: S) -> Self {
        Self { message: message.to_string() }
    }
}

//--------------------------------------          Auth         ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: mkp_common::Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// The user and a fresh token pair, returned on registration and login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Roles,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
}

impl AuthResponse {
    pub fn new(account: UserWithRoles, tokens: TokenPair) -> Self {
        let UserWithRoles { user, roles } = account;
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            roles,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub user_id: i64,
    #[serde(default)]
    pub apply: Vec<Role>,
    #[serde(default)]
    pub revoke: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateResponse {
    pub user_id: i64,
    pub roles: Roles,
}

//--------------------------------------        Accounts       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub roles: Roles,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub user_info: User,
    pub statistics: DashboardStats,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self { user_info: d.user_info, statistics: d.statistics }
    }
}

//--------------------------------------        Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategoryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            icon: c.icon,
            product_count: c.product_count,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// The category id
    pub category: i64,
    pub category_name: String,
    pub price: Money,
    pub quantity: i64,
    pub condition: ProductCondition,
    pub year_of_manufacture: Option<i64>,
    pub brand: String,
    pub model: String,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub material: String,
    pub color: String,
    pub original_packaging: bool,
    pub manual_instructions: bool,
    pub working_condition_description: String,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub location: String,
    pub seller: SellerSummary,
    pub is_sold: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            category: p.category_id,
            category_name: p.category_name,
            price: p.price,
            quantity: p.quantity,
            condition: p.condition,
            year_of_manufacture: p.year_of_manufacture,
            brand: p.brand,
            model: p.model,
            length: p.length,
            width: p.width,
            height: p.height,
            weight: p.weight,
            material: p.material,
            color: p.color,
            original_packaging: p.original_packaging,
            manual_instructions: p.manual_instructions,
            working_condition_description: p.working_condition_description,
            image: p.image,
            image_url: p.image_url,
            location: p.location,
            seller: SellerSummary { id: p.seller_id, username: p.seller_username },
            is_sold: p.is_sold,
            view_count: p.view_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductImageResponse {
    pub id: i64,
    pub image_url: String,
    pub is_main: bool,
    pub sort_order: i64,
    pub alt_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProductImage> for ProductImageResponse {
    fn from(i: ProductImage) -> Self {
        Self {
            id: i.id,
            image_url: i.image_url,
            is_main: i.is_main,
            sort_order: i.sort_order,
            alt_text: i.alt_text,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub page: Page<ProductResponse>,
    pub query: String,
    pub filters_applied: FiltersApplied,
}

//--------------------------------------          Cart         ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineResponse {
    pub id: i64,
    pub product: ProductResponse,
    pub quantity: i64,
    pub total_price: Money,
    pub added_at: DateTime<Utc>,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            product: line.product.into(),
            quantity: line.quantity,
            total_price: line.total_price,
            added_at: line.added_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub id: i64,
    pub user: i64,
    pub items: Vec<CartLineResponse>,
    pub total_items: i64,
    pub total_price: Money,
    pub updated_at: DateTime<Utc>,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            id: cart.id,
            user: cart.user_id,
            items: cart.items.into_iter().map(CartLineResponse::from).collect(),
            total_items: cart.total_items,
            total_price: cart.total_price,
            updated_at: cart.updated_at,
        }
    }
}

//--------------------------------------       Purchases       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseLineResponse {
    pub id: i64,
    pub product: ProductResponse,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub total_price: Money,
}

impl From<PurchaseLine> for PurchaseLineResponse {
    fn from(line: PurchaseLine) -> Self {
        Self {
            id: line.id,
            product: line.product.into(),
            quantity: line.quantity,
            price_at_purchase: line.price_at_purchase,
            total_price: line.total_price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub id: i64,
    pub order_number: String,
    pub buyer: i64,
    pub items: Vec<PurchaseLineResponse>,
    pub shipping_address: String,
    pub payment_method: String,
    pub total_amount: Money,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PurchaseDetail> for PurchaseResponse {
    fn from(p: PurchaseDetail) -> Self {
        Self {
            id: p.id,
            order_number: p.order_number,
            buyer: p.buyer_id,
            items: p.items.into_iter().map(PurchaseLineResponse::from).collect(),
            shipping_address: p.shipping_address,
            payment_method: p.payment_method,
            total_amount: p.total_amount,
            status: p.status,
            created_at: p.created_at,
            completed_at: p.completed_at,
        }
    }
}

//--------------------------------------     Query strings     ---------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn pagination(&self) -> Result<Pagination, ServerError> {
        Pagination::from_query(self.page.as_deref(), self.page_size.as_deref())
            .map_err(|_| ServerError::NotFound("Invalid page.".into()))
    }
}

/// Query parameters for product listings and search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Free text. `search` is used by the listing endpoint, `q` by the search endpoint.
    pub search: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub sort: Option<String>,
    #[serde(flatten)]
    pub paging: PageQuery,
}

impl ProductQuery {
    /// Builds the product filter. The free-text `search` term is included; the search endpoint handles `q` itself.
    pub fn filter(&self) -> Result<ProductQueryFilter, ServerError> {
        let mut errors = ValidationErrors::new();
        let mut filter = ProductQueryFilter::default().sorted_by(SortOrder::from_query(self.sort.as_deref()));
        if let Some(search) = non_blank(&self.search) {
            filter = filter.with_search(search);
        }
        if let Some(category) = non_blank(&self.category) {
            filter = filter.with_category(category);
        }
        if let Some(price) = parse_field::<Money>(&mut errors, "min_price", &self.min_price, "Enter a number.") {
            filter = filter.with_min_price(price);
        }
        if let Some(price) = parse_field::<Money>(&mut errors, "max_price", &self.max_price, "Enter a number.") {
            filter = filter.with_max_price(price);
        }
        let msg = "Select a valid choice.";
        if let Some(condition) = parse_field::<ProductCondition>(&mut errors, "condition", &self.condition, msg) {
            filter = filter.with_condition(condition);
        }
        if let Some(location) = non_blank(&self.location) {
            filter = filter.with_location(location);
        }
        errors.into_result().map_err(|e| ServerError::invalid("Invalid query parameters.", e))?;
        Ok(filter)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyListingsQuery {
    pub status: Option<String>,
    #[serde(flatten)]
    pub paging: PageQuery,
}

impl MyListingsQuery {
    pub fn status(&self) -> ListingStatus {
        ListingStatus::from_query(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(flatten)]
    pub paging: PageQuery,
}

impl HistoryQuery {
    pub fn filter(&self, buyer_id: i64) -> Result<PurchaseQueryFilter, ServerError> {
        let mut errors = ValidationErrors::new();
        let mut filter = PurchaseQueryFilter::for_buyer(buyer_id);
        let msg = "Select a valid choice.";
        if let Some(status) = parse_field::<PurchaseStatus>(&mut errors, "status", &self.status, msg) {
            filter = filter.with_status(status);
        }
        let msg = "Enter a valid date in the format YYYY-MM-DD.";
        if let Some(date) = parse_field::<NaiveDate>(&mut errors, "date_from", &self.date_from, msg) {
            filter = filter.since(date);
        }
        if let Some(date) = parse_field::<NaiveDate>(&mut errors, "date_to", &self.date_to, msg) {
            filter = filter.until(date);
        }
        errors.into_result().map_err(|e| ServerError::invalid("Invalid query parameters.", e))?;
        Ok(filter)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_field<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<String>,
    message: &str,
) -> Option<T> {
    let value = non_blank(value)?;
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, message);
            None
        },
    }
}
