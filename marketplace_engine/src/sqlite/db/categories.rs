use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Category, NewCategory},
    helpers::ValidationErrors,
    traits::CatalogError,
};

const CATEGORY_SELECT: &str = r#"SELECT c.id, c.name, c.slug, c.description, c.icon, c.created_at,
    (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count
    FROM categories c"#;

pub async fn fetch_categories(conn: &mut SqliteConnection) -> Result<Vec<Category>, CatalogError> {
    let categories =
        sqlx::query_as::<_, Category>(&format!("{CATEGORY_SELECT} ORDER BY c.name")).fetch_all(conn).await?;
    Ok(categories)
}

pub async fn fetch_category(category_id: i64, conn: &mut SqliteConnection) -> Result<Option<Category>, CatalogError> {
    let category = sqlx::query_as::<_, Category>(&format!("{CATEGORY_SELECT} WHERE c.id = ?"))
        .bind(category_id)
        .fetch_optional(conn)
        .await?;
    Ok(category)
}

pub async fn category_exists(category_id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)")
        .bind(category_id)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Inserts a new category. A name or slug that is already in use results in a validation error.
pub async fn insert_category(category: &NewCategory, conn: &mut SqliteConnection) -> Result<i64, CatalogError> {
    let result = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name, slug, description, icon) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(&category.icon)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(id) => {
            info!("🗃️ New category #{id} '{}' created", category.name);
            Ok(id)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let (name_taken, slug_taken) = sqlx::query_as::<_, (bool, bool)>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ?), EXISTS(SELECT 1 FROM categories WHERE slug = \
                 ?)",
            )
            .bind(&category.name)
            .bind(&category.slug)
            .fetch_one(conn)
            .await?;
            let mut errors = ValidationErrors::new();
            if name_taken {
                errors.add("name", "Category with this name already exists.");
            }
            if slug_taken || errors.is_empty() {
                errors.add("slug", "Category with this slug already exists.");
            }
            Err(CatalogError::ValidationError(errors))
        },
        Err(e) => Err(e.into()),
    }
}
