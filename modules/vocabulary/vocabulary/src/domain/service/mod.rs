//! Domain service layer - business logic and rules.
//!
//! Per-resource submodules:
//! - `users` - registration, login, token authentication, settings
//! - `collections` - collection lifecycle, in-collection search, PDF export
//! - `words` - word lifecycle, paging, translation
//! - `statistics` - super-user aggregates across all tenants
//!
//! The domain layer talks to storage and external systems only through the
//! traits in `domain::repos` and `domain::ports`; the API layer depends on it,
//! never the other way round.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::DomainError;
use crate::domain::ports::{CredentialHasher, ObjectStorage, PdfRenderer, TokenService, Translator};
use crate::domain::repos::{
    CollectionsRepository, SearchIndexProvisioner, UsersRepository, WordsRepository,
};

mod collections;
mod statistics;
mod users;
mod words;

pub use collections::{CollectionsService, PdfExport};
pub use statistics::StatisticsService;
pub use users::UsersService;
pub use words::{WordsService, provider_language_code, search_settings_from_query};

#[cfg(test)]
pub(crate) mod test_support;

/// Configuration for the domain services
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub enforce_collection_ownership: bool,
    pub cascade_collection_delete: bool,
    pub words_unpaged_cap: u64,
    pub token_ttl: Duration,
    pub min_password_length: usize,
    pub max_name_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enforce_collection_ownership: false,
            cascade_collection_delete: false,
            words_unpaged_cap: 1000,
            token_ttl: Duration::from_secs(24 * 60 * 60),
            min_password_length: 6,
            max_name_length: 255,
        }
    }
}

/// Stores and collaborators the services are built from.
#[derive(Clone)]
pub struct Dependencies {
    pub users: Arc<dyn UsersRepository>,
    pub collections: Arc<dyn CollectionsRepository>,
    pub words: Arc<dyn WordsRepository>,
    pub index: Arc<dyn SearchIndexProvisioner>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub translator: Arc<dyn Translator>,
    pub storage: Arc<dyn ObjectStorage>,
    pub pdf: Arc<dyn PdfRenderer>,
}

// DI Container - aggregates all domain services
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UsersService>,
    pub collections: Arc<CollectionsService>,
    pub words: Arc<WordsService>,
    pub statistics: Arc<StatisticsService>,
}

impl AppServices {
    #[must_use]
    pub fn new(deps: &Dependencies, config: &ServiceConfig) -> Self {
        let config = Arc::new(config.clone());
        Self {
            users: Arc::new(UsersService::new(
                deps.users.clone(),
                deps.index.clone(),
                deps.hasher.clone(),
                deps.tokens.clone(),
                config.clone(),
            )),
            collections: Arc::new(CollectionsService::new(
                deps.collections.clone(),
                deps.words.clone(),
                deps.index.clone(),
                deps.storage.clone(),
                deps.pdf.clone(),
                config.clone(),
            )),
            words: Arc::new(WordsService::new(
                deps.words.clone(),
                deps.collections.clone(),
                deps.translator.clone(),
                config,
            )),
            statistics: Arc::new(StatisticsService::new(
                deps.users.clone(),
                deps.collections.clone(),
                deps.words.clone(),
            )),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn require_positive_id(field: &str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::validation(field, "must be a positive id"));
    }
    Ok(())
}
