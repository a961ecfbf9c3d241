use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewUser, User, UserCredentials},
    helpers::ValidationErrors,
    mkp_api::account_objects::{DashboardStats, UserProfileUpdate},
    traits::AccountApiError,
};

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, phone, address, city, state, zip_code, profile_image, created_at, \
     updated_at";

/// Inserts a new user. If the email address or username is already taken, a validation error naming the taken
/// field(s) is returned.
pub async fn insert_user(user: &NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    let sql = format!(
        "INSERT INTO users (email, username, password_hash, first_name, last_name) VALUES (?, ?, ?, ?, ?) RETURNING \
         {USER_COLUMNS}"
    );
    let result = sqlx::query_as::<_, User>(&sql)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&mut *conn)
        .await;
    match result {
        Ok(user) => {
            debug!("🗃️ New user #{} ({}) saved", user.id, user.username);
            Ok(user)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let errors = taken_user_fields(Some(&user.email), Some(&user.username), None, conn).await?;
            Err(AccountApiError::ValidationError(errors))
        },
        Err(e) => Err(e.into()),
    }
}

/// Reports which of the given email address and username belong to a user other than `exclude_id`.
async fn taken_user_fields(
    email: Option<&str>,
    username: Option<&str>,
    exclude_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<ValidationErrors, AccountApiError> {
    let exclude_id = exclude_id.unwrap_or(-1);
    let (email_taken, username_taken) = sqlx::query_as::<_, (bool, bool)>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND id != ?3), EXISTS(SELECT 1 FROM users WHERE username \
         = ?2 AND id != ?3)",
    )
    .bind(email.unwrap_or_default())
    .bind(username.unwrap_or_default())
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    let mut errors = ValidationErrors::new();
    if email.is_some() && email_taken {
        errors.add("email", "A user with this email already exists.");
    }
    if username.is_some() && username_taken {
        errors.add("username", "A user with that username already exists.");
    }
    if errors.is_empty() {
        errors.add("non_field_errors", "This account conflicts with an existing account.");
    }
    Ok(errors)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_credentials(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserCredentials>, AccountApiError> {
    let creds = sqlx::query_as::<_, UserCredentials>("SELECT id, password_hash FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(creds)
}

/// Applies the non-empty fields of `update` to the user's profile.
pub async fn update_profile(
    user_id: i64,
    update: UserProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, AccountApiError> {
    let username = update.username.clone();
    let mut builder = QueryBuilder::new("UPDATE users SET ");
    let mut set_clause = builder.separated(", ");
    let fields = [
        ("username", update.username),
        ("first_name", update.first_name),
        ("last_name", update.last_name),
        ("phone", update.phone),
        ("address", update.address),
        ("city", update.city),
        ("state", update.state),
        ("zip_code", update.zip_code),
    ];
    for (column, value) in fields {
        if let Some(value) = value {
            set_clause.push(format!("{column} = "));
            set_clause.push_bind_unseparated(value);
        }
    }
    if let Some(image) = update.profile_image {
        set_clause.push("profile_image = ");
        set_clause.push_bind_unseparated(Some(image).filter(|s| !s.trim().is_empty()));
    }
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    builder.push(" WHERE id = ");
    builder.push_bind(user_id);
    builder.push(format!(" RETURNING {USER_COLUMNS}"));
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build_query_as::<User>().fetch_optional(&mut *conn).await;
    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let errors = taken_user_fields(None, username.as_deref(), Some(user_id), conn).await?;
            Err(AccountApiError::ValidationError(errors))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn dashboard_stats(user_id: i64, conn: &mut SqliteConnection) -> Result<DashboardStats, AccountApiError> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"SELECT
            (SELECT COUNT(*) FROM products WHERE seller_id = ?1) AS total_listings,
            (SELECT COUNT(*) FROM products WHERE seller_id = ?1 AND is_sold = 0) AS active_listings,
            (SELECT COUNT(*) FROM products WHERE seller_id = ?1 AND is_sold = 1) AS sold_items,
            (SELECT COUNT(*) FROM purchases WHERE buyer_id = ?1) AS total_purchases,
            (SELECT COALESCE(SUM(ci.quantity), 0) FROM cart_items ci JOIN carts c ON c.id = ci.cart_id
                WHERE c.user_id = ?1) AS cart_items_count
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(stats)
}
