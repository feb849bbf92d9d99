use async_trait::async_trait;
use vocabulary_sdk::{User, UserSettings};

/// A user together with the stored password digest.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Persistence of accounts and their one-to-one settings.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert the user and an empty settings row atomically.
    async fn create_with_settings(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User>;

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>>;

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;

    /// Owner of the given collection.
    async fn find_by_collection_id(&self, collection_id: i64) -> anyhow::Result<Option<User>>;

    async fn list(&self) -> anyhow::Result<Vec<User>>;

    /// Returns `None` when the user has no settings row.
    async fn update_language(
        &self,
        user_id: i64,
        language: &str,
    ) -> anyhow::Result<Option<UserSettings>>;
}
