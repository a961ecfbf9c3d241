use std::{fmt::Display, str::FromStr};

use mkp_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewProduct, Product, ProductCondition},
    helpers::{ValidationErrors, MAX_QUANTITY, MAX_QUANTITY_MESSAGE},
    mkp_api::pagination::Page,
};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_PRICE: Money = Money::from_cents(99_999_999_99);

//--------------------------------------       SortOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    DateAsc,
    #[default]
    DateDesc,
}

impl SortOrder {
    /// Unknown or missing sort keys fall back to newest first.
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    /// The SQL `ORDER BY` expression for this sort order. Ties are broken by id so that paging is stable.
    pub fn order_by_clause(&self) -> &'static str {
        match self {
            SortOrder::PriceAsc => "p.price ASC, p.id ASC",
            SortOrder::PriceDesc => "p.price DESC, p.id DESC",
            SortOrder::DateAsc => "p.created_at ASC, p.id ASC",
            SortOrder::DateDesc => "p.created_at DESC, p.id DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "date_asc" => Ok(Self::DateAsc),
            "date_desc" => Ok(Self::DateDesc),
            s => Err(format!("Unknown sort order: {s}")),
        }
    }
}

//--------------------------------------     ListingStatus     ---------------------------------------------------------
/// Filter for a seller's own listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingStatus {
    #[default]
    All,
    Active,
    Sold,
}

impl ListingStatus {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("active") => Self::Active,
            Some("sold") => Self::Sold,
            _ => Self::All,
        }
    }

    pub fn is_sold(&self) -> Option<bool> {
        match self {
            ListingStatus::All => None,
            ListingStatus::Active => Some(false),
            ListingStatus::Sold => Some(true),
        }
    }
}

//--------------------------------------  ProductQueryFilter   ---------------------------------------------------------
/// Criteria for listing products. All criteria are AND-combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQueryFilter {
    /// Case-insensitive substring match on title and description.
    pub search: Option<String>,
    /// When set, `search` also matches the category name.
    pub search_category_names: bool,
    /// Category slug
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub condition: Option<ProductCondition>,
    /// Case-insensitive substring match on location.
    pub location: Option<String>,
    pub seller_id: Option<i64>,
    pub is_sold: Option<bool>,
    pub sort: SortOrder,
}

impl ProductQueryFilter {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn including_category_names(mut self) -> Self {
        self.search_category_names = true;
        self
    }

    pub fn with_category<S: Into<String>>(mut self, slug: S) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn with_min_price(mut self, price: Money) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn with_max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn with_condition(mut self, condition: ProductCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_seller(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_sold_status(mut self, is_sold: Option<bool>) -> Self {
        self.is_sold = is_sold;
        self
    }

    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// True if there are no filtering criteria. The sort order is not a criterion.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() &&
            self.category.is_none() &&
            self.min_price.is_none() &&
            self.max_price.is_none() &&
            self.condition.is_none() &&
            self.location.is_none() &&
            self.seller_id.is_none() &&
            self.is_sold.is_none()
    }

    pub fn filters_applied(&self) -> FiltersApplied {
        let price_range = if self.min_price.is_some() || self.max_price.is_some() {
            Some(PriceRange { min: self.min_price, max: self.max_price })
        } else {
            None
        };
        FiltersApplied { category: self.category.clone(), price_range, condition: self.condition }
    }
}

impl Display for ProductQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters. Sorted by {:?}.", self.sort);
        }
        if let Some(search) = &self.search {
            write!(f, "search: {search}. ")?;
        }
        if let Some(category) = &self.category {
            write!(f, "category: {category}. ")?;
        }
        if let Some(min) = &self.min_price {
            write!(f, "min_price: {min}. ")?;
        }
        if let Some(max) = &self.max_price {
            write!(f, "max_price: {max}. ")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, "condition: {condition}. ")?;
        }
        if let Some(location) = &self.location {
            write!(f, "location: {location}. ")?;
        }
        if let Some(seller_id) = &self.seller_id {
            write!(f, "seller: {seller_id}. ")?;
        }
        if let Some(is_sold) = &self.is_sold {
            write!(f, "is_sold: {is_sold}. ")?;
        }
        write!(f, "Sorted by {:?}.", self.sort)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: Option<Money>,
    pub max: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiltersApplied {
    pub category: Option<String>,
    pub price_range: Option<PriceRange>,
    pub condition: Option<ProductCondition>,
}

/// The result of a free-text search: a page of products, plus an echo of the query and the filters in force.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    #[serde(flatten)]
    pub page: Page<Product>,
    pub query: String,
    pub filters_applied: FiltersApplied,
}

//--------------------------------------     ProductDraft      ---------------------------------------------------------
/// The fields a seller supplies when listing a new product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<i64>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
    pub condition: Option<ProductCondition>,
    pub year_of_manufacture: Option<i64>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub original_packaging: bool,
    #[serde(default)]
    pub manual_instructions: bool,
    #[serde(default)]
    pub working_condition_description: String,
    pub image: Option<String>,
    #[serde(default)]
    pub location: String,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, &self.title);
        errors.require_non_blank("description", &self.description);
        if self.category.is_none() {
            errors.add("category", "This field is required.");
        }
        match self.price {
            None => errors.add("price", "This field is required."),
            Some(p) => check_price(&mut errors, p),
        }
        if let Some(q) = self.quantity {
            check_quantity(&mut errors, q);
        }
        check_product_details(&mut errors, self.year_of_manufacture, [self.length, self.width, self.height, self.weight]);
        errors.into_result()
    }

    /// Converts the draft into a [`NewProduct`] for the given seller. Call [`ProductDraft::validate`] first; missing
    /// required fields are filled with defaults here.
    pub fn into_new_product(self, seller_id: i64) -> NewProduct {
        NewProduct {
            title: self.title.trim().to_string(),
            description: self.description,
            category_id: self.category.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            quantity: self.quantity.unwrap_or(1),
            condition: self.condition.unwrap_or_default(),
            year_of_manufacture: self.year_of_manufacture,
            brand: self.brand,
            model: self.model,
            length: self.length,
            width: self.width,
            height: self.height,
            weight: self.weight,
            material: self.material,
            color: self.color,
            original_packaging: self.original_packaging,
            manual_instructions: self.manual_instructions,
            working_condition_description: self.working_condition_description,
            image: self.image.filter(|s| !s.trim().is_empty()),
            location: self.location,
            seller_id,
        }
    }
}

//--------------------------------------     ProductUpdate     ---------------------------------------------------------
/// A partial update to a product. `None` fields are left untouched. The seller can never be changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<i64>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
    pub condition: Option<ProductCondition>,
    pub year_of_manufacture: Option<i64>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub original_packaging: Option<bool>,
    pub manual_instructions: Option<bool>,
    pub working_condition_description: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub is_sold: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(description) = &self.description {
            errors.require_non_blank("description", description);
        }
        if let Some(price) = self.price {
            check_price(&mut errors, price);
        }
        if let Some(q) = self.quantity {
            check_quantity(&mut errors, q);
        }
        check_product_details(&mut errors, self.year_of_manufacture, [self.length, self.width, self.height, self.weight]);
        errors.into_result()
    }
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    errors.require_non_blank("title", title);
    if title.chars().count() > MAX_TITLE_LENGTH {
        errors.add("title", format!("Ensure this field has no more than {MAX_TITLE_LENGTH} characters."));
    }
}

fn check_price(errors: &mut ValidationErrors, price: Money) {
    if price.is_negative() {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
    }
    if price > MAX_PRICE {
        errors.add("price", "Ensure that there are no more than 10 digits in total.");
    }
}

fn check_quantity(errors: &mut ValidationErrors, quantity: i64) {
    if quantity < 1 {
        errors.add("quantity", "Ensure this value is greater than or equal to 1.");
    }
    if quantity > MAX_QUANTITY {
        errors.add("quantity", MAX_QUANTITY_MESSAGE);
    }
}

fn check_product_details(errors: &mut ValidationErrors, year: Option<i64>, dimensions: [Option<f64>; 4]) {
    if year.is_some_and(|y| y < 0) {
        errors.add("year_of_manufacture", "Ensure this value is greater than or equal to 0.");
    }
    let names = ["length", "width", "height", "weight"];
    for (name, value) in names.iter().zip(dimensions) {
        if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            errors.add(*name, "Ensure this value is greater than or equal to 0.");
        }
    }
}
