use thiserror::Error;

use crate::{
    db_types::{NewUser, Role, User, UserCredentials},
    helpers::ValidationErrors,
    mkp_api::account_objects::{DashboardStats, UserProfileUpdate},
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Invalid account data. {0}")]
    ValidationError(ValidationErrors),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

impl From<ValidationErrors> for AccountApiError {
    fn from(e: ValidationErrors) -> Self {
        AccountApiError::ValidationError(e)
    }
}

/// The `AccountManagement` trait defines behaviour for creating and querying user accounts.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates a new user and grants them the given roles in a single atomic operation. If the email address or the
    /// username is already taken, a [`AccountApiError::ValidationError`] naming the offending field(s) is returned.
    async fn create_user(&self, user: NewUser, roles: &[Role]) -> Result<User, AccountApiError>;

    /// Fetches the user with the given id. If no user exists, `None` is returned.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;

    /// Fetches the id and password hash for the given email address.
    async fn fetch_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AccountApiError>;

    /// Applies a partial profile update. A username that is already taken by another user results in a
    /// [`AccountApiError::ValidationError`].
    async fn update_user_profile(&self, user_id: i64, update: UserProfileUpdate) -> Result<User, AccountApiError>;

    /// Counts of the user's listings, purchases and cart contents.
    async fn fetch_dashboard_stats(&self, user_id: i64) -> Result<DashboardStats, AccountApiError>;
}
