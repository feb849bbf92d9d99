use async_trait::async_trait;
use vocabulary_sdk::{Collection, NewCollection};

/// Persistence of collection records. Returned collections carry no words.
#[async_trait]
pub trait CollectionsRepository: Send + Sync {
    async fn create(&self, owner_id: i64, new: &NewCollection) -> anyhow::Result<Collection>;

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Collection>>;

    /// Exact, case-sensitive name lookup across all owners.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Collection>>;

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Collection>>;

    async fn list(&self) -> anyhow::Result<Vec<Collection>>;

    async fn update_name(&self, id: i64, name: &str) -> anyhow::Result<Option<Collection>>;

    async fn set_pdf_url(&self, id: i64, url: &str) -> anyhow::Result<()>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}
