use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vocabulary_sdk::{Collection, CollectionPatch, NewCollection, SearchSettings, Word};

use super::{ServiceConfig, require_non_empty, require_positive_id};
use crate::domain::error::DomainError;
use crate::domain::ports::{ObjectStorage, PdfRenderer, WordRow};
use crate::domain::repos::{
    CollectionsRepository, SearchIndexProvisioner, WordScope, WordsRepository,
};

/// A rendered collection ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Public URL of the uploaded copy, when the upload succeeded.
    pub url: Option<String>,
}

pub struct CollectionsService {
    repo: Arc<dyn CollectionsRepository>,
    words: Arc<dyn WordsRepository>,
    index: Arc<dyn SearchIndexProvisioner>,
    storage: Arc<dyn ObjectStorage>,
    pdf: Arc<dyn PdfRenderer>,
    config: Arc<ServiceConfig>,
}

impl CollectionsService {
    pub fn new(
        repo: Arc<dyn CollectionsRepository>,
        words: Arc<dyn WordsRepository>,
        index: Arc<dyn SearchIndexProvisioner>,
        storage: Arc<dyn ObjectStorage>,
        pdf: Arc<dyn PdfRenderer>,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            repo,
            words,
            index,
            storage,
            pdf,
            config,
        }
    }

    /// Create a collection owned by `owner_id` and provision its alias.
    ///
    /// # Errors
    /// Validation failures, `Conflict` for a taken name, store or index failures.
    /// An alias failure leaves the stored collection in place.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, owner_id: i64, new: NewCollection) -> Result<Collection, DomainError> {
        info!("Creating collection");
        let new = NewCollection {
            name: new.name.trim().to_owned(),
            lang_from: new.lang_from.trim().to_owned(),
            lang_to: new.lang_to.trim().to_owned(),
        };
        self.validate_name(&new.name)?;
        require_non_empty("langFrom", &new.lang_from)?;
        require_non_empty("langTo", &new.lang_to)?;
        if new.lang_from.eq_ignore_ascii_case(&new.lang_to) {
            return Err(DomainError::validation(
                "langTo",
                "source and target languages must differ",
            ));
        }

        self.ensure_name_free(&new.name, None).await?;

        let collection = self
            .repo
            .create(owner_id, &new)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;

        self.index
            .ensure_collection_alias(owner_id, collection.id)
            .await
            .map_err(|e| {
                DomainError::search(format!(
                    "failed to provision alias for collection {}: {e:#}",
                    collection.id
                ))
            })?;

        info!(collection_id = collection.id, "Collection created");
        Ok(collection)
    }

    /// All collections of `owner_id`, each with its full word list.
    ///
    /// Collections whose words cannot be fetched are left out.
    ///
    /// # Errors
    /// Store failure while listing the collections themselves.
    pub async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<Collection>, DomainError> {
        let collections = self
            .repo
            .list_by_owner(owner_id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;

        let mut with_words = Vec::with_capacity(collections.len());
        for mut collection in collections {
            let scope = WordScope::new(owner_id, collection.id);
            match self
                .words
                .list(scope, 0, self.config.words_unpaged_cap)
                .await
            {
                Ok(page) => {
                    collection.words = page.words;
                    with_words.push(collection);
                }
                Err(e) => {
                    warn!(
                        collection_id = collection.id,
                        error = %e,
                        "Skipping collection whose words could not be loaded"
                    );
                }
            }
        }
        Ok(with_words)
    }

    /// # Errors
    /// `NotFound` when missing (or foreign, with ownership enforcement on).
    pub async fn get(&self, user_id: i64, id: i64) -> Result<Collection, DomainError> {
        self.load_accessible(user_id, id).await
    }

    /// Rename a collection. Other fields are immutable.
    ///
    /// # Errors
    /// Validation failures, `NotFound`, `Conflict` for a taken name.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        patch: CollectionPatch,
    ) -> Result<Collection, DomainError> {
        let name = patch.name.trim();
        self.validate_name(name)?;

        let current = self.load_accessible(user_id, id).await?;
        if current.name == name {
            return Ok(current);
        }
        self.ensure_name_free(name, Some(id)).await?;

        let updated = self
            .repo
            .update_name(id, name)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::not_found("Collection", id))?;

        info!(collection_id = id, "Collection renamed");
        Ok(updated)
    }

    /// # Errors
    /// `NotFound` or a store failure.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), DomainError> {
        let collection = self.load_accessible(user_id, id).await?;

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        if !deleted {
            return Err(DomainError::not_found("Collection", id));
        }

        if self.config.cascade_collection_delete {
            self.purge_search_data(collection.owner_id, id).await;
        }

        info!(collection_id = id, "Collection deleted");
        Ok(())
    }

    /// Search a collection. `None` settings (empty text) yield no results.
    ///
    /// # Errors
    /// `NotFound` for the collection or a search failure.
    #[instrument(skip(self, settings))]
    pub async fn search(
        &self,
        user_id: i64,
        id: i64,
        settings: Option<SearchSettings>,
    ) -> Result<Vec<Word>, DomainError> {
        self.load_accessible(user_id, id).await?;

        let Some(settings) = settings else {
            debug!("Empty search text, returning no words");
            return Ok(Vec::new());
        };

        self.words
            .search(WordScope::new(user_id, id), &settings)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))
    }

    /// Render the caller's words of a collection as a two-column PDF.
    ///
    /// The document is also uploaded to object storage; an upload failure
    /// is logged and the export still succeeds.
    ///
    /// # Errors
    /// `NotFound`, a search failure, or a rendering failure.
    #[instrument(skip(self))]
    pub async fn export_pdf(&self, user_id: i64, id: i64) -> Result<PdfExport, DomainError> {
        let collection = self.load_accessible(user_id, id).await?;

        let page = self
            .words
            .list(WordScope::new(user_id, id), 0, self.config.words_unpaged_cap)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;

        let rows: Vec<WordRow> = page
            .words
            .into_iter()
            .map(|w| WordRow {
                word: w.word,
                translation: w.translation,
            })
            .collect();

        let renderer = self.pdf.clone();
        let title = collection.name.clone();
        let content = tokio::task::spawn_blocking(move || renderer.render_word_table(&title, &rows))
            .await
            .map_err(|e| DomainError::internal(format!("pdf task failed: {e}")))?
            .map_err(|e| DomainError::internal(format!("failed to render pdf: {e:#}")))?;

        let file_name = format!("{}.pdf", collection.name);
        let key = format!("{user_id}/{file_name}");
        let url = match self
            .storage
            .put_public(&key, content.clone(), "application/pdf")
            .await
        {
            Ok(url) => {
                if let Err(e) = self.repo.set_pdf_url(id, &url).await {
                    warn!(collection_id = id, error = %e, "Failed to record pdf url");
                }
                Some(url)
            }
            Err(e) => {
                warn!(collection_id = id, error = %e, "PDF upload failed (continuing)");
                None
            }
        };

        info!(collection_id = id, bytes = content.len(), "Collection exported");
        Ok(PdfExport {
            file_name,
            content,
            url,
        })
    }

    async fn load_accessible(&self, user_id: i64, id: i64) -> Result<Collection, DomainError> {
        require_positive_id("id", id)?;
        let collection = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::not_found("Collection", id))?;

        if self.config.enforce_collection_ownership && collection.owner_id != user_id {
            debug!(collection_id = id, user_id, "Hiding foreign collection");
            return Err(DomainError::not_found("Collection", id));
        }
        Ok(collection)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i64>) -> Result<(), DomainError> {
        let existing = self
            .repo
            .find_by_name(name)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        match existing {
            Some(c) if Some(c.id) != except => Err(DomainError::conflict(format!(
                "collection with name '{name}' already exists"
            ))),
            _ => Ok(()),
        }
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        require_non_empty("name", name)?;
        if name.chars().count() > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!("must be at most {} characters", self.config.max_name_length),
            ));
        }
        if name.contains(['/', '\\', '"']) {
            return Err(DomainError::validation(
                "name",
                "must not contain slashes or quotes",
            ));
        }
        Ok(())
    }

    async fn purge_search_data(&self, owner_id: i64, id: i64) {
        let scope = WordScope::new(owner_id, id);
        match self.words.delete_all(scope).await {
            Ok(removed) => debug!(collection_id = id, removed, "Removed collection words"),
            Err(e) => warn!(collection_id = id, error = %e, "Failed to remove collection words"),
        }
        if let Err(e) = self.index.remove_collection_alias(owner_id, id).await {
            warn!(collection_id = id, error = %e, "Failed to remove collection alias");
        }
    }
}
