use chrono::{DateTime, Utc};
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{db_types::Role, traits::AuthApiError};

pub async fn roles_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Role>, AuthApiError> {
    let names = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = ? ORDER BY role DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    let roles = names
        .iter()
        .map(|r| r.parse::<Role>())
        .collect::<Result<Vec<Role>, _>>()
        .map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
    Ok(roles)
}

/// Grants the roles to the user. Roles the user already holds are ignored.
pub async fn assign_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::new("INSERT OR IGNORE INTO user_roles (user_id, role) ");
    qb.push_values(roles, |mut values, role| {
        values.push_bind(user_id);
        values.push_bind(role.to_string());
    });
    let result = qb.build().execute(conn).await;
    match result {
        Ok(res) => {
            debug!("🔐️ {} new roles assigned to user #{user_id}", res.rows_affected());
            Ok(())
        },
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(AuthApiError::UserNotFound(user_id)),
        Err(e) => Err(e.into()),
    }
}

/// Removes the roles from the user, returning the number of roles that were actually removed.
pub async fn remove_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    if roles.is_empty() {
        return Ok(0);
    }
    let mut qb = QueryBuilder::new("DELETE FROM user_roles WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND role IN (");
    let mut values = qb.separated(", ");
    for role in roles {
        values.push_bind(role.to_string());
    }
    values.push_unseparated(")");
    let result = qb.build().execute(conn).await?;
    debug!("🔐️ {} roles removed from user #{user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn revoke_token(
    jti: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(conn)
        .await?;
    debug!("🔐️ Token {jti} for user #{user_id} revoked");
    Ok(())
}

pub async fn is_token_revoked(jti: &str, conn: &mut SqliteConnection) -> Result<bool, AuthApiError> {
    let revoked = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = ?)")
        .bind(jti)
        .fetch_one(conn)
        .await?;
    Ok(revoked)
}

pub async fn purge_expired_tokens(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?").bind(now).execute(conn).await?;
    Ok(result.rows_affected())
}
