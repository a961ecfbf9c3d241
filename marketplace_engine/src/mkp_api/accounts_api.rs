//! Unifies API for accessing user profiles.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::User,
    mkp_api::account_objects::{Dashboard, UserProfileUpdate},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides a unified API for reading and editing user profiles.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn profile(&self, user_id: i64) -> Result<User, AccountApiError> {
        self.db.fetch_user(user_id).await?.ok_or(AccountApiError::UserNotFound(user_id))
    }

    /// Applies a partial update to the user's profile and returns the updated profile. An empty update is not an
    /// error; the current profile is returned unchanged.
    pub async fn update_profile(&self, user_id: i64, update: UserProfileUpdate) -> Result<User, AccountApiError> {
        update.validate()?;
        if update.is_empty() {
            return self.profile(user_id).await;
        }
        let user = self.db.update_user_profile(user_id, update).await?;
        debug!("🗃️ Profile of user #{user_id} updated");
        Ok(user)
    }

    pub async fn dashboard(&self, user_id: i64) -> Result<Dashboard, AccountApiError> {
        let user_info = self.profile(user_id).await?;
        let statistics = self.db.fetch_dashboard_stats(user_id).await?;
        trace!("🗃️ Dashboard for user #{user_id}: {statistics:?}");
        Ok(Dashboard { user_info, statistics })
    }
}
