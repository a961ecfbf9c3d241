//! Registration, login and authorisation bookkeeping.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{NewUser, Role, Roles},
    helpers::{hash_password, verify_password, DUMMY_PASSWORD_HASH},
    mkp_api::account_objects::{Registration, UserWithRoles},
    traits::{AccountManagement, AuthApiError, AuthManagement},
};

/// `AuthApi` registers users, checks their credentials and manages their roles and revoked tokens.
///
/// Issuing and validating the tokens themselves is left to the server.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AccountManagement + AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new user with the `user` role.
    pub async fn register(&self, registration: Registration) -> Result<UserWithRoles, AuthApiError> {
        registration.validate().map_err(AuthApiError::ValidationError)?;
        let password_hash =
            hash_password(registration.password.reveal()).map_err(|e| AuthApiError::PasswordError(e.to_string()))?;
        let new_user = NewUser {
            email: registration.normalized_email(),
            username: registration.username,
            password_hash,
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
        };
        let roles = vec![Role::User];
        let user = self.db.create_user(new_user, &roles).await?;
        info!("🔐️ New user #{} ({}) registered", user.id, user.username);
        Ok(UserWithRoles { user, roles })
    }

    /// Checks the email and password. Unknown emails and wrong passwords produce the same
    /// [`AuthApiError::InvalidCredentials`] error, and take the same time to check.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserWithRoles, AuthApiError> {
        let email = email.trim().to_lowercase();
        let Some(creds) = self.db.fetch_credentials(&email).await? else {
            debug!("🔐️ Login attempt for unknown email {email}");
            let _ = verify_password(password, DUMMY_PASSWORD_HASH);
            return Err(AuthApiError::InvalidCredentials);
        };
        let valid = verify_password(password, &creds.password_hash).map_err(|e| {
            error!("🔐️ Could not verify password for user #{}: {e}", creds.id);
            AuthApiError::InvalidCredentials
        })?;
        if !valid {
            debug!("🔐️ Wrong password for user #{}", creds.id);
            return Err(AuthApiError::InvalidCredentials);
        }
        let result = self.user_with_roles(creds.id).await?;
        info!("🔐️ User #{} ({}) logged in", result.user.id, result.user.username);
        Ok(result)
    }

    /// Fetches the user and their current roles.
    pub async fn user_with_roles(&self, user_id: i64) -> Result<UserWithRoles, AuthApiError> {
        let user = self.db.fetch_user(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))?;
        let roles = self.db.fetch_roles_for_user(user_id).await?;
        Ok(UserWithRoles { user, roles })
    }

    pub async fn roles_for_user(&self, user_id: i64) -> Result<Roles, AuthApiError> {
        self.db.fetch_roles_for_user(user_id).await
    }

    pub async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        self.db.check_user_has_roles(user_id, roles).await
    }

    /// Grants `add` and then takes away `remove`. Returns the user's roles afterwards. The `user` role cannot be removed.
    pub async fn update_roles(&self, user_id: i64, add: &[Role], remove: &[Role]) -> Result<Roles, AuthApiError> {
        if remove.contains(&Role::User) {
            return Err(AuthApiError::RoleLocked(Role::User));
        }
        if self.db.fetch_user(user_id).await?.is_none() {
            return Err(AuthApiError::UserNotFound(user_id));
        }
        self.db.assign_roles(user_id, add).await?;
        let removed = self.db.remove_roles(user_id, remove).await?;
        info!("🔐️ Roles of user #{user_id} updated. Granted: {add:?}. {removed} removed.");
        self.db.fetch_roles_for_user(user_id).await
    }

    /// Grants the admin role to every registered user whose email is in the list. Returns the number of users
    /// found. Emails without an account are logged and skipped.
    pub async fn promote_admins(&self, emails: &[String]) -> Result<usize, AuthApiError> {
        let mut promoted = 0;
        for email in emails {
            let email = email.trim().to_lowercase();
            match self.db.fetch_user_by_email(&email).await? {
                Some(user) => {
                    self.db.assign_roles(user.id, &[Role::Admin]).await?;
                    promoted += 1;
                },
                None => warn!("🔐️ {email} is configured as an admin, but there is no account with that email yet."),
            }
        }
        Ok(promoted)
    }

    pub async fn revoke_token(&self, jti: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<(), AuthApiError> {
        self.db.revoke_token(jti, user_id, expires_at).await
    }

    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool, AuthApiError> {
        self.db.is_token_revoked(jti).await
    }

    pub async fn purge_expired_tokens(&self) -> Result<u64, AuthApiError> {
        let n = self.db.purge_expired_tokens().await?;
        if n > 0 {
            debug!("🔐️ {n} expired entries removed from the token blacklist");
        }
        Ok(n)
    }
}
