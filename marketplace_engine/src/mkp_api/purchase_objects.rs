use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use mkp_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Product, Purchase, PurchaseItem, PurchaseStatus},
    helpers::{ValidationErrors, MAX_QUANTITY},
};

/// The maximum difference between the client's declared total and the total computed from current prices.
pub const TOTAL_TOLERANCE: Money = Money::from_cents(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LineItem {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// A buyer's request to purchase a set of products.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: String,
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub cart_id: Option<i64>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_blank("shipping_address", &self.shipping_address);
        errors.require_non_blank("payment_method", &self.payment_method);
        if self.payment_method.chars().count() > 50 {
            errors.add("payment_method", "Ensure this field has no more than 50 characters.");
        }
        match self.total_amount {
            None => errors.add("total_amount", "This field is required."),
            Some(t) if t.is_negative() => errors.add("total_amount", "Ensure this value is greater than or equal to 0."),
            Some(_) => {},
        }
        if self.items.is_empty() {
            errors.add("items", "This list may not be empty.");
        }
        for item in &self.items {
            if item.quantity < 1 {
                errors.add("items", format!("Quantity for product {} must be at least 1.", item.product_id));
            }
            if item.quantity > MAX_QUANTITY {
                errors.add("items", format!("Quantity for product {} must be at most {MAX_QUANTITY}.", item.product_id));
            }
        }
        errors.into_result()
    }

    /// Line items with duplicate product ids merged into one, with the quantities summed. Ordered by product id.
    ///
    /// Fails if a merged quantity exceeds [`MAX_QUANTITY`].
    pub fn merged_items(&self) -> Result<Vec<LineItem>, ValidationErrors> {
        let mut merged = BTreeMap::<i64, i64>::new();
        for item in &self.items {
            let quantity = merged.entry(item.product_id).or_default();
            *quantity = quantity.checked_add(item.quantity).filter(|q| *q <= MAX_QUANTITY).ok_or_else(|| {
                ValidationErrors::single(
                    "items",
                    format!("Quantity for product {} must be at most {MAX_QUANTITY}.", item.product_id),
                )
            })?;
        }
        Ok(merged.into_iter().map(|(product_id, quantity)| LineItem { product_id, quantity }).collect())
    }
}

/// A line item priced at the current product price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLineItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLineItem {
    /// `None` if the total does not fit in a [`Money`].
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Everything the backend needs to record a purchase atomically.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub order_number: String,
    pub buyer_id: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub total_amount: Money,
    pub items: Vec<PricedLineItem>,
    /// If this cart belongs to the buyer, its items are removed once the purchase is recorded.
    pub cart_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseLine {
    pub id: i64,
    pub product: Product,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub total_price: Money,
}

impl PurchaseLine {
    pub fn new(item: PurchaseItem, product: Product) -> Result<Self, ValidationErrors> {
        let total_price = item
            .price_at_purchase
            .checked_mul(item.quantity)
            .ok_or_else(|| ValidationErrors::single("items", format!("The total for product {} is too large.", product.id)))?;
        Ok(Self {
            id: item.id,
            product,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            total_price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseDetail {
    pub id: i64,
    pub order_number: String,
    #[serde(rename = "buyer")]
    pub buyer_id: i64,
    pub items: Vec<PurchaseLine>,
    pub shipping_address: String,
    pub payment_method: String,
    pub total_amount: Money,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PurchaseDetail {
    pub fn new(purchase: Purchase, items: Vec<PurchaseLine>) -> Self {
        Self {
            id: purchase.id,
            order_number: purchase.order_number,
            buyer_id: purchase.buyer_id,
            items,
            shipping_address: purchase.shipping_address,
            payment_method: purchase.payment_method,
            total_amount: purchase.total_amount,
            status: purchase.status,
            created_at: purchase.created_at,
            completed_at: purchase.completed_at,
        }
    }
}

/// Criteria for a buyer's purchase history. Dates are inclusive and compared against the calendar date of creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseQueryFilter {
    pub buyer_id: Option<i64>,
    pub status: Option<PurchaseStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl PurchaseQueryFilter {
    pub fn for_buyer(buyer_id: i64) -> Self {
        Self { buyer_id: Some(buyer_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: PurchaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() && self.status.is_none() && self.date_from.is_none() && self.date_to.is_none()
    }
}
