use mkp_common::Secret;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    db_types::{Roles, User},
    helpers::validation::{is_valid_email, is_valid_username, password_problems, ValidationErrors},
};

/// A request to register a new user account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret<String>,
    #[serde(default)]
    pub password_confirm: Secret<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Registration {
    /// Checks the shape of every field. Uniqueness of email and username is checked by the backend.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "This field may not be blank.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "Enter a valid email address.");
        }
        if self.username.is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if !is_valid_username(&self.username) {
            errors.add(
                "username",
                "Enter a valid username of 3 to 150 characters. This value may contain only letters, numbers, and \
                 @/./+/-/_ characters.",
            );
        }
        for problem in password_problems(self.password.reveal()) {
            errors.add("password", problem);
        }
        if self.password.reveal() != self.password_confirm.reveal() {
            errors.add("password_confirm", "Password fields didn't match.");
        }
        errors.into_result()
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Partial update of a user's profile. `None` fields are left untouched. The email address is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfileUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub profile_image: Option<String>,
}

impl UserProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(username) = &self.username {
            if !is_valid_username(username) {
                errors.add("username", "Enter a valid username of 3 to 150 characters.");
            }
        }
        if self.phone.as_ref().is_some_and(|p| p.chars().count() > 20) {
            errors.add("phone", "Ensure this field has no more than 20 characters.");
        }
        if self.zip_code.as_ref().is_some_and(|z| z.chars().count() > 10) {
            errors.add("zip_code", "Ensure this field has no more than 10 characters.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct DashboardStats {
    pub total_listings: i64,
    pub active_listings: i64,
    pub sold_items: i64,
    pub total_purchases: i64,
    pub cart_items_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub user_info: User,
    pub statistics: DashboardStats,
}

/// A user together with the roles they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Roles,
}
