use log::*;
use mkp_common::Money;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::like_pattern;
use crate::{
    db_types::{NewProduct, NewProductImage, Product, ProductImage},
    helpers::ValidationErrors,
    mkp_api::{
        pagination::Pagination,
        product_objects::{ProductQueryFilter, ProductUpdate},
    },
    traits::CatalogError,
};

const PRODUCT_JOINS: &str =
    " FROM products p JOIN categories c ON c.id = p.category_id JOIN users u ON u.id = p.seller_id";

const PRODUCT_COLUMNS: &str = r#"SELECT p.id, p.title, p.description, p.category_id, c.name AS category_name,
    p.price, p.quantity, p.condition, p.year_of_manufacture, p.brand, p.model, p.length, p.width, p.height, p.weight,
    p.material, p.color, p.original_packaging, p.manual_instructions, p.working_condition_description, p.image,
    COALESCE(
        (SELECT i.image_url FROM product_images i WHERE i.product_id = p.id AND i.is_main = 1 LIMIT 1),
        p.image
    ) AS image_url,
    p.location, p.seller_id, u.username AS seller_username, p.is_sold, p.view_count, p.created_at, p.updated_at"#;

fn product_query() -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(PRODUCT_COLUMNS);
    builder.push(PRODUCT_JOINS);
    builder
}

pub async fn insert_product(product: &NewProduct, conn: &mut SqliteConnection) -> Result<i64, CatalogError> {
    let result = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO products (title, description, category_id, price, quantity, condition, year_of_manufacture,
            brand, model, length, width, height, weight, material, color, original_packaging, manual_instructions,
            working_condition_description, image, location, seller_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id"#,
    )
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.category_id)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.condition.to_string())
    .bind(product.year_of_manufacture)
    .bind(&product.brand)
    .bind(&product.model)
    .bind(product.length)
    .bind(product.width)
    .bind(product.height)
    .bind(product.weight)
    .bind(&product.material)
    .bind(&product.color)
    .bind(product.original_packaging)
    .bind(product.manual_instructions)
    .bind(&product.working_condition_description)
    .bind(&product.image)
    .bind(&product.location)
    .bind(product.seller_id)
    .fetch_one(conn)
    .await;
    match result {
        Ok(id) => {
            debug!("🗃️ Product #{id} '{}' listed by user #{}", product.title, product.seller_id);
            Ok(id)
        },
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(CatalogError::ValidationError(
            ValidationErrors::single("category", format!("Invalid pk \"{}\" - object does not exist.", product.category_id)),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, CatalogError> {
    let mut builder = product_query();
    builder.push(" WHERE p.id = ");
    builder.push_bind(product_id);
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    Ok(product)
}

/// Fetches the given products, in no particular order. Ids that do not exist are skipped.
pub async fn fetch_products_by_ids(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Product>, CatalogError> {
    fetch_products_in(ids, false, conn).await
}

/// Like [`fetch_products_by_ids`], but only returns products that are still for sale.
pub async fn fetch_available_products(
    ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, CatalogError> {
    fetch_products_in(ids, true, conn).await
}

async fn fetch_products_in(
    ids: &[i64],
    only_available: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, CatalogError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = product_query();
    builder.push(" WHERE p.id IN (");
    let mut values = builder.separated(", ");
    for id in ids {
        values.push_bind(*id);
    }
    values.push_unseparated(")");
    if only_available {
        builder.push(" AND p.is_sold = 0");
    }
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

pub async fn increment_view_count(product_id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogError> {
    let result = sqlx::query("UPDATE products SET view_count = view_count + 1 WHERE id = ?")
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_available(product_id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogError> {
    let available = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = ? AND is_sold = 0)")
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(available)
}

/// Marks the product as sold, but only if it is currently unsold. Returns the product's price if the product was
/// marked, and `None` if it does not exist or was already sold.
pub async fn mark_sold_if_available(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Money>, CatalogError> {
    let price = sqlx::query_scalar::<_, Money>(
        "UPDATE products SET is_sold = 1, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND is_sold = 0 RETURNING price",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(price)
}

macro_rules! set_column {
    ($clause:ident, $update:ident, $field:ident) => {
        if let Some(value) = $update.$field {
            $clause.push(concat!(stringify!($field), " = "));
            $clause.push_bind_unseparated(value);
        }
    };
}

/// Applies the non-empty fields of `update` to the product. Returns `false` if the product does not exist.
pub async fn update_product(
    product_id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<bool, CatalogError> {
    let mut builder = QueryBuilder::new("UPDATE products SET ");
    let mut set_clause = builder.separated(", ");
    set_column!(set_clause, update, title);
    set_column!(set_clause, update, description);
    if let Some(category_id) = update.category {
        set_clause.push("category_id = ");
        set_clause.push_bind_unseparated(category_id);
    }
    set_column!(set_clause, update, price);
    set_column!(set_clause, update, quantity);
    if let Some(condition) = update.condition {
        set_clause.push("condition = ");
        set_clause.push_bind_unseparated(condition.to_string());
    }
    set_column!(set_clause, update, year_of_manufacture);
    set_column!(set_clause, update, brand);
    set_column!(set_clause, update, model);
    set_column!(set_clause, update, length);
    set_column!(set_clause, update, width);
    set_column!(set_clause, update, height);
    set_column!(set_clause, update, weight);
    set_column!(set_clause, update, material);
    set_column!(set_clause, update, color);
    set_column!(set_clause, update, original_packaging);
    set_column!(set_clause, update, manual_instructions);
    set_column!(set_clause, update, working_condition_description);
    if let Some(image) = update.image {
        set_clause.push("image = ");
        set_clause.push_bind_unseparated(Some(image).filter(|s| !s.trim().is_empty()));
    }
    set_column!(set_clause, update, location);
    set_column!(set_clause, update, is_sold);
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await;
    match result {
        Ok(res) => Ok(res.rows_affected() > 0),
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(CatalogError::ValidationError(
            ValidationErrors::single("category", "Invalid pk - object does not exist."),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_product(product_id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogError> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?").bind(product_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

fn push_filters(builder: &mut QueryBuilder<'static, Sqlite>, filter: &ProductQueryFilter) {
    if !filter.is_empty() {
        builder.push(" WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        where_clause.push("(p.title LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR p.description LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\'");
        if filter.search_category_names {
            where_clause.push_unseparated(" OR c.name LIKE ");
            where_clause.push_bind_unseparated(pattern);
            where_clause.push_unseparated(" ESCAPE '\\'");
        }
        where_clause.push_unseparated(")");
    }
    if let Some(slug) = &filter.category {
        where_clause.push("c.slug = ");
        where_clause.push_bind_unseparated(slug.clone());
    }
    if let Some(min) = filter.min_price {
        where_clause.push("p.price >= ");
        where_clause.push_bind_unseparated(min);
    }
    if let Some(max) = filter.max_price {
        where_clause.push("p.price <= ");
        where_clause.push_bind_unseparated(max);
    }
    if let Some(condition) = filter.condition {
        where_clause.push("p.condition = ");
        where_clause.push_bind_unseparated(condition.to_string());
    }
    if let Some(location) = &filter.location {
        where_clause.push("p.location LIKE ");
        where_clause.push_bind_unseparated(like_pattern(location));
        where_clause.push_unseparated(" ESCAPE '\\'");
    }
    if let Some(seller_id) = filter.seller_id {
        where_clause.push("p.seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(is_sold) = filter.is_sold {
        where_clause.push("p.is_sold = ");
        where_clause.push_bind_unseparated(is_sold);
    }
}

/// Fetches one page of products matching the filter, and the total number of matching products.
pub async fn search_products(
    filter: &ProductQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Product>, i64), CatalogError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*)");
    count_query.push(PRODUCT_JOINS);
    push_filters(&mut count_query, filter);
    let count = count_query.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = product_query();
    push_filters(&mut builder, filter);
    builder.push(format!(" ORDER BY {}", filter.sort.order_by_clause()));
    builder.push(" LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    trace!("🗃️ Product search ({filter}) matched {count} products");
    Ok((products, count))
}

//--------------------------------------     Product images     --------------------------------------------------------

pub async fn clear_main_image(product_id: i64, conn: &mut SqliteConnection) -> Result<u64, CatalogError> {
    let result = sqlx::query("UPDATE product_images SET is_main = 0 WHERE product_id = ? AND is_main = 1")
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_product_image(
    product_id: i64,
    image: &NewProductImage,
    conn: &mut SqliteConnection,
) -> Result<ProductImage, CatalogError> {
    let result = sqlx::query_as::<_, ProductImage>(
        "INSERT INTO product_images (product_id, image_url, is_main, sort_order, alt_text) VALUES (?, ?, ?, ?, ?) \
         RETURNING *",
    )
    .bind(product_id)
    .bind(&image.image_url)
    .bind(image.is_main)
    .bind(image.sort_order)
    .bind(&image.alt_text)
    .fetch_one(conn)
    .await;
    match result {
        Ok(image) => Ok(image),
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(CatalogError::ProductNotFound(product_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_product_images(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductImage>, CatalogError> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = ? ORDER BY is_main DESC, sort_order ASC, id ASC",
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;
    Ok(images)
}
