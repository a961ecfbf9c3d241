use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Purchase, PurchaseItem},
    mkp_api::{
        pagination::Pagination,
        purchase_objects::{NewPurchase, PricedLineItem, PurchaseQueryFilter},
    },
    traits::CheckoutError,
};

pub async fn insert_purchase(purchase: &NewPurchase, conn: &mut SqliteConnection) -> Result<Purchase, CheckoutError> {
    let record = sqlx::query_as::<_, Purchase>(
        r#"INSERT INTO purchases (order_number, buyer_id, shipping_address, payment_method, total_amount)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *"#,
    )
    .bind(&purchase.order_number)
    .bind(purchase.buyer_id)
    .bind(&purchase.shipping_address)
    .bind(&purchase.payment_method)
    .bind(purchase.total_amount)
    .fetch_one(conn)
    .await?;
    debug!("💳️ Purchase {} (#{}) recorded for user #{}", record.order_number, record.id, record.buyer_id);
    Ok(record)
}

pub async fn insert_purchase_item(
    purchase_id: i64,
    item: &PricedLineItem,
    conn: &mut SqliteConnection,
) -> Result<PurchaseItem, CheckoutError> {
    let item = sqlx::query_as::<_, PurchaseItem>(
        "INSERT INTO purchase_items (purchase_id, product_id, quantity, price_at_purchase) VALUES (?, ?, ?, ?) \
         RETURNING *",
    )
    .bind(purchase_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_purchase(purchase_id: i64, conn: &mut SqliteConnection) -> Result<Option<Purchase>, CheckoutError> {
    let purchase = sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = ?")
        .bind(purchase_id)
        .fetch_optional(conn)
        .await?;
    Ok(purchase)
}

pub async fn fetch_purchase_items(
    purchase_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PurchaseItem>, CheckoutError> {
    let items = sqlx::query_as::<_, PurchaseItem>("SELECT * FROM purchase_items WHERE purchase_id = ? ORDER BY id")
        .bind(purchase_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

fn push_filters(builder: &mut QueryBuilder<'static, Sqlite>, filter: &PurchaseQueryFilter) {
    if !filter.is_empty() {
        builder.push(" WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = filter.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(since) = filter.date_from {
        where_clause.push("date(created_at) >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.date_to {
        where_clause.push("date(created_at) <= ");
        where_clause.push_bind_unseparated(until);
    }
}

/// Fetches one page of purchases matching the filter, newest first, and the total number of matches.
pub async fn search_purchases(
    filter: &PurchaseQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Purchase>, i64), CheckoutError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM purchases");
    push_filters(&mut count_query, filter);
    let count = count_query.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM purchases");
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let purchases = builder.build_query_as::<Purchase>().fetch_all(conn).await?;
    Ok((purchases, count))
}
