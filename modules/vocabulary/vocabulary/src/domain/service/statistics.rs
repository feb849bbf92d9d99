use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use vocabulary_sdk::{
    Collection, Creator, CreatorWord, SearchSettings, StatInterval, TimeBucket, User,
};

use crate::domain::error::DomainError;
use crate::domain::repos::{CollectionsRepository, UsersRepository, WordsRepository};

/// Read-only aggregates over every tenant. Callers must be super-users.
pub struct StatisticsService {
    users: Arc<dyn UsersRepository>,
    collections: Arc<dyn CollectionsRepository>,
    words: Arc<dyn WordsRepository>,
}

impl StatisticsService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        collections: Arc<dyn CollectionsRepository>,
        words: Arc<dyn WordsRepository>,
    ) -> Self {
        Self {
            users,
            collections,
            words,
        }
    }

    /// # Errors
    /// Store failure.
    pub async fn users(&self) -> Result<Vec<User>, DomainError> {
        self.users
            .list()
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))
    }

    /// # Errors
    /// Store failure.
    pub async fn collections(&self) -> Result<Vec<Collection>, DomainError> {
        self.collections
            .list()
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))
    }

    /// Total number of words across all users.
    ///
    /// # Errors
    /// Store or search failure.
    pub async fn words_count(&self) -> Result<u64, DomainError> {
        let user_ids = self.user_ids().await?;
        self.words
            .count_all(&user_ids)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))
    }

    /// Word creation counts bucketed by calendar interval.
    ///
    /// # Errors
    /// Validation failure for a missing or unknown interval; store or search failure.
    pub async fn words_per_time(&self, interval: Option<&str>) -> Result<Vec<TimeBucket>, DomainError> {
        let interval: StatInterval = interval
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::validation("time", "is required"))?
            .parse()
            .map_err(|msg: String| DomainError::validation("time", msg))?;

        let user_ids = self.user_ids().await?;
        self.words
            .count_per_interval(&user_ids, interval)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))
    }

    /// Search every user's words and attach each hit's owner.
    ///
    /// An owner that cannot be resolved is logged and reported as `None`.
    ///
    /// # Errors
    /// Store or search failure for the search itself.
    pub async fn search_all(
        &self,
        settings: Option<SearchSettings>,
    ) -> Result<Vec<CreatorWord>, DomainError> {
        let Some(settings) = settings else {
            debug!("Empty search text, returning no words");
            return Ok(Vec::new());
        };

        let user_ids = self.user_ids().await?;
        let hits = self
            .words
            .search_all(&user_ids, &settings)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;

        let mut owners: HashMap<i64, Option<Creator>> = HashMap::new();
        let mut result = Vec::with_capacity(hits.len());
        for word in hits {
            let creator = match owners.get(&word.collection_id) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved = self.resolve_owner(word.collection_id).await;
                    owners.insert(word.collection_id, resolved.clone());
                    resolved
                }
            };
            result.push(CreatorWord { word, creator });
        }
        Ok(result)
    }

    async fn resolve_owner(&self, collection_id: i64) -> Option<Creator> {
        match self.users.find_by_collection_id(collection_id).await {
            Ok(Some(user)) => Some(Creator {
                name: user.name,
                email: user.email,
            }),
            Ok(None) => {
                warn!(collection_id, "No owner found for collection");
                None
            }
            Err(e) => {
                warn!(collection_id, error = %e, "Owner lookup failed (continuing)");
                None
            }
        }
    }

    async fn user_ids(&self) -> Result<Vec<i64>, DomainError> {
        Ok(self.users().await?.into_iter().map(|u| u.id).collect())
    }
}
