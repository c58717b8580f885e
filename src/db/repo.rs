use async_trait::async_trait;
use tracing::{error, info};

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `DbError::AlreadyExists` when the email is taken.
    async fn create_user(&self, user: &User) -> DbResult<()>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
}

#[async_trait]
pub trait UserShowRepo: Send + Sync {
    async fn add_user_show(&self, show: &UserShow) -> DbResult<()>;
    /// Remove every row for the show's `(user, show, type)` triple and
    /// insert this one, in a single transaction.
    async fn replace_user_show(&self, show: &UserShow) -> DbResult<()>;
    /// Returns the number of rows removed.
    async fn remove_user_show(
        &self,
        user_id: &str,
        show_id: &str,
        list_type: ListType,
    ) -> DbResult<u64>;
    async fn find_user_show(
        &self,
        user_id: &str,
        show_id: &str,
        list_type: ListType,
    ) -> DbResult<Option<UserShow>>;
    async fn list_user_shows_by_type(
        &self,
        user_id: &str,
        list_type: ListType,
    ) -> DbResult<Vec<UserShow>>;
    async fn list_user_shows(&self, user_id: &str) -> DbResult<Vec<UserShow>>;
}

#[async_trait]
pub trait Repository: UserRepo + UserShowRepo + Send + Sync {
    async fn init_schema(&self) -> DbResult<()>;
    fn backend(&self) -> &'static str;
}

/// Create the tables if needed. Failures are logged and otherwise ignored,
/// so the server still comes up against an unprovisioned store.
pub async fn initialize_database(repo: &dyn Repository) {
    match repo.init_schema().await {
        Ok(()) => info!(backend = repo.backend(), "Database initialized"),
        Err(e) => error!(backend = repo.backend(), "Failed to initialize database: {}", e),
    }
}
