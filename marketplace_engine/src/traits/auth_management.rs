use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{db_types::Role, helpers::ValidationErrors, traits::AccountApiError};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Invalid registration data. {0}")]
    ValidationError(ValidationErrors),
    #[error("Password could not be processed: {0}")]
    PasswordError(String),
    #[error("User requested at least {0} roles that are not allowed")]
    RoleNotAllowed(usize),
    #[error("The {0} role cannot be removed")]
    RoleLocked(Role),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

impl From<AccountApiError> for AuthApiError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => AuthApiError::DatabaseError(s),
            AccountApiError::UserNotFound(id) => AuthApiError::UserNotFound(id),
            AccountApiError::ValidationError(errors) => AuthApiError::ValidationError(errors),
        }
    }
}

/// The `AuthManagement` trait defines behaviour for managing authorisation: user roles and the refresh token
/// blacklist. Token signing and validation happen at the server level.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Fetches the roles for the given user. If the user is not found, the request still succeeds and returns
    /// an empty vector.
    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;

    /// Checks whether the user holds **all** of the given roles. If any are missing,
    /// [`AuthApiError::RoleNotAllowed`] is returned, with the number of missing roles given as the parameter.
    async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let held = self.fetch_roles_for_user(user_id).await?;
        let missing = roles.iter().filter(|r| !held.contains(r)).count();
        match missing {
            0 => Ok(()),
            n => Err(AuthApiError::RoleNotAllowed(n)),
        }
    }

    /// Assigns the given roles to the user. This function must be idempotent.
    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Removes the given roles from the user. The number of roles actually removed is returned. This function must be
    /// idempotent.
    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;

    /// Adds the token id to the blacklist. Revoking an already revoked token is not an error.
    async fn revoke_token(&self, jti: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<(), AuthApiError>;

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, AuthApiError>;

    /// Deletes blacklist entries for tokens that have expired anyway. Returns the number of entries removed.
    async fn purge_expired_tokens(&self) -> Result<u64, AuthApiError>;
}
