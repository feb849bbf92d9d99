use async_trait::async_trait;
use vocabulary_sdk::{NewWord, SearchSettings, StatInterval, TimeBucket, Word, WordsPage};

/// The (user, collection) partition a word operation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordScope {
    pub user_id: i64,
    pub collection_id: i64,
}

impl WordScope {
    #[must_use]
    pub fn new(user_id: i64, collection_id: i64) -> Self {
        Self {
            user_id,
            collection_id,
        }
    }
}

/// Word storage in the per-user search index.
#[async_trait]
pub trait WordsRepository: Send + Sync {
    async fn create(&self, scope: WordScope, new: &NewWord) -> anyhow::Result<Word>;

    async fn bulk_create(&self, scope: WordScope, words: &[NewWord]) -> anyhow::Result<Vec<Word>>;

    /// Words in scope whose origin term is one of `terms`.
    async fn find_by_terms(&self, scope: WordScope, terms: &[String]) -> anyhow::Result<Vec<Word>>;

    async fn get_by_id(&self, scope: WordScope, id: &str) -> anyhow::Result<Option<Word>>;

    /// One slice of the collection plus the total hit count.
    async fn list(&self, scope: WordScope, from: u64, size: u64) -> anyhow::Result<WordsPage>;

    async fn update(&self, scope: WordScope, word: &Word) -> anyhow::Result<()>;

    /// Missing documents are not an error.
    async fn delete(&self, scope: WordScope, id: &str) -> anyhow::Result<()>;

    /// Removes every word of the collection, returning how many were deleted.
    async fn delete_all(&self, scope: WordScope) -> anyhow::Result<u64>;

    async fn search(&self, scope: WordScope, settings: &SearchSettings) -> anyhow::Result<Vec<Word>>;

    /// Search across the indices of all given users.
    async fn search_all(
        &self,
        user_ids: &[i64],
        settings: &SearchSettings,
    ) -> anyhow::Result<Vec<Word>>;

    async fn count_all(&self, user_ids: &[i64]) -> anyhow::Result<u64>;

    async fn count_per_interval(
        &self,
        user_ids: &[i64],
        interval: StatInterval,
    ) -> anyhow::Result<Vec<TimeBucket>>;
}

/// Idempotent creation of per-user indices and per-collection aliases.
#[async_trait]
pub trait SearchIndexProvisioner: Send + Sync {
    async fn ensure_user_index(&self, user_id: i64) -> anyhow::Result<()>;

    async fn ensure_collection_alias(&self, user_id: i64, collection_id: i64)
    -> anyhow::Result<()>;

    async fn remove_collection_alias(&self, user_id: i64, collection_id: i64)
    -> anyhow::Result<()>;
}
