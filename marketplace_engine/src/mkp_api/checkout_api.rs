//! Checkout and purchase history.
//!
//! A checkout is priced on the server. The client declares the total it expects to pay, and the purchase only goes
//! through if that total is within [`TOTAL_TOLERANCE`] of the sum of current prices. Recording the purchase, marking
//! the products as sold and emptying the buyer's cart happen in one transaction in the backend, which also rejects
//! products that were sold or re-priced after they were priced here.
use std::{collections::HashMap, fmt::Debug};

use log::*;
use mkp_common::Money;

use crate::{
    db_types::Product,
    helpers::{new_order_number, ValidationErrors},
    mkp_api::{
        pagination::{Page, Pagination},
        purchase_objects::{
            CheckoutRequest,
            NewPurchase,
            PricedLineItem,
            PurchaseDetail,
            PurchaseQueryFilter,
            TOTAL_TOLERANCE,
        },
    },
    traits::{CheckoutError, PurchaseManagement},
};

pub struct CheckoutApi<B> {
    db: B,
}

impl<B: Debug> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({:?})", self.db)
    }
}

impl<B> CheckoutApi<B>
where B: PurchaseManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Turns the request into a purchase.
    ///
    /// Fails with
    /// * [`CheckoutError::ValidationError`] if the request is malformed,
    /// * [`CheckoutError::ProductUnavailable`] if any product does not exist or is already sold,
    /// * [`CheckoutError::TotalMismatch`] if the declared total is off by more than [`TOTAL_TOLERANCE`],
    /// * [`CheckoutError::PriceChanged`] if a product's price changed between pricing and recording.
    ///
    /// Nothing is written unless the whole purchase succeeds.
    pub async fn checkout(&self, buyer_id: i64, request: CheckoutRequest) -> Result<PurchaseDetail, CheckoutError> {
        request.validate()?;
        let items = request.merged_items()?;
        let ids = items.iter().map(|i| i.product_id).collect::<Vec<i64>>();
        let available = self
            .db
            .fetch_available_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect::<HashMap<i64, Product>>();
        let priced = items
            .iter()
            .map(|item| match available.get(&item.product_id) {
                Some(p) => Ok(PricedLineItem { product_id: p.id, quantity: item.quantity, unit_price: p.price }),
                None => Err(CheckoutError::ProductUnavailable(item.product_id)),
            })
            .collect::<Result<Vec<PricedLineItem>, CheckoutError>>()?;
        let computed = priced
            .iter()
            .map(PricedLineItem::line_total)
            .try_fold(Money::default(), |total, line| line.and_then(|l| total.checked_add(l)))
            .ok_or_else(|| ValidationErrors::single("items", "The order total is too large."))?;
        let declared = request.total_amount.unwrap_or_default();
        if (declared - computed).abs() > TOTAL_TOLERANCE {
            info!("💳️ Checkout by user #{buyer_id} rejected. Declared total {declared}, but the items cost {computed}");
            return Err(CheckoutError::TotalMismatch { declared, computed });
        }
        let purchase = NewPurchase {
            order_number: new_order_number(),
            buyer_id,
            shipping_address: request.shipping_address.trim().to_string(),
            payment_method: request.payment_method.trim().to_string(),
            total_amount: computed,
            items: priced,
            cart_id: request.cart_id,
        };
        let record = self.db.insert_purchase(purchase).await?;
        info!("💳️ Purchase {} by user #{buyer_id} for {} completed", record.order_number, record.total_amount);
        let lines = self.db.fetch_purchase_lines(record.id).await?;
        Ok(PurchaseDetail::new(record, lines))
    }

    /// The buyer's purchases, newest first.
    pub async fn history(
        &self,
        buyer_id: i64,
        filter: PurchaseQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<PurchaseDetail>, CheckoutError> {
        let filter = PurchaseQueryFilter { buyer_id: Some(buyer_id), ..filter };
        let (purchases, count) = self.db.search_purchases(filter, pagination).await?;
        let mut details = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            let lines = self.db.fetch_purchase_lines(purchase.id).await?;
            details.push(PurchaseDetail::new(purchase, lines));
        }
        Ok(Page::new(details, count, pagination)?)
    }

    /// Fetches one of the buyer's purchases. Other users' purchases are reported as not found.
    pub async fn purchase(&self, buyer_id: i64, purchase_id: i64) -> Result<PurchaseDetail, CheckoutError> {
        let purchase = self
            .db
            .fetch_purchase(purchase_id)
            .await?
            .filter(|p| p.buyer_id == buyer_id)
            .ok_or(CheckoutError::PurchaseNotFound(purchase_id))?;
        let lines = self.db.fetch_purchase_lines(purchase.id).await?;
        Ok(PurchaseDetail::new(purchase, lines))
    }
}
