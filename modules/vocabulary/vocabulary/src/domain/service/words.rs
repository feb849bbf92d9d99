use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use vocabulary_sdk::{
    NewWord, PageRequest, SearchField, SearchSettings, TranslatedWord, Word, WordPatch, WordsPage,
};

use super::{ServiceConfig, require_non_empty, require_positive_id};
use crate::domain::error::DomainError;
use crate::domain::ports::Translator;
use crate::domain::repos::{CollectionsRepository, WordScope, WordsRepository};

/// Map a collection language code to the translation provider's code.
#[must_use]
pub fn provider_language_code(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_lowercase().as_str() {
        "ua" | "uk" => Some("uk"),
        "en" => Some("en"),
        "de" => Some("de"),
        "fr" => Some("fr"),
        "es" => Some("es"),
        "it" => Some("it"),
        "pl" => Some("pl"),
        "pt" => Some("pt"),
        _ => None,
    }
}

/// Build search settings from raw query values.
///
/// `Ok(None)` means the text is empty and the search must return nothing.
///
/// # Errors
/// Validation failure when `searchBy` is missing or not a searchable field.
pub fn search_settings_from_query(
    search_by: Option<&str>,
    text: Option<&str>,
    parts_of_speech: Option<&str>,
) -> Result<Option<SearchSettings>, DomainError> {
    let search_by = search_by
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DomainError::validation("searchBy", "is required"))?;
    let search_by: SearchField = search_by
        .parse()
        .map_err(|msg: String| DomainError::validation("searchBy", msg))?;

    let text = text.unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(None);
    }

    let parts_of_speech = parts_of_speech
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(Some(SearchSettings {
        text: text.trim().to_owned(),
        search_by,
        parts_of_speech,
    }))
}

pub struct WordsService {
    repo: Arc<dyn WordsRepository>,
    collections: Arc<dyn CollectionsRepository>,
    translator: Arc<dyn Translator>,
    config: Arc<ServiceConfig>,
}

impl WordsService {
    pub fn new(
        repo: Arc<dyn WordsRepository>,
        collections: Arc<dyn CollectionsRepository>,
        translator: Arc<dyn Translator>,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            repo,
            collections,
            translator,
            config,
        }
    }

    /// Add a word unless its origin term already exists in the collection.
    ///
    /// # Errors
    /// Validation failures, `Conflict` for an existing term, search failures.
    #[instrument(skip(self, new), fields(collection_id = new.collection_id))]
    pub async fn create(&self, user_id: i64, new: NewWord) -> Result<Word, DomainError> {
        let new = normalize(new);
        validate_new_word(&new)?;
        self.check_collection(user_id, new.collection_id).await?;

        let scope = WordScope::new(user_id, new.collection_id);
        self.ensure_terms_free(scope, std::slice::from_ref(&new.word), None)
            .await?;

        let word = self
            .repo
            .create(scope, &new)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;

        info!(word_id = %word.id, "Word created");
        Ok(word)
    }

    /// Add a batch of words; nothing is written if any term already exists.
    ///
    /// # Errors
    /// Validation failures (empty batch, repeated terms), `Conflict`, search failures.
    #[instrument(skip(self, words), fields(count = words.len()))]
    pub async fn bulk_create(
        &self,
        user_id: i64,
        collection_id: i64,
        words: Vec<NewWord>,
    ) -> Result<Vec<Word>, DomainError> {
        require_positive_id("collectionId", collection_id)?;
        if words.is_empty() {
            return Err(DomainError::validation("words", "must not be empty"));
        }

        let words: Vec<NewWord> = words
            .into_iter()
            .map(|w| normalize(NewWord { collection_id, ..w }))
            .collect();
        let mut seen = HashSet::with_capacity(words.len());
        for w in &words {
            validate_new_word(w)?;
            if !seen.insert(w.word.as_str()) {
                return Err(DomainError::validation(
                    "words",
                    format!("term '{}' appears more than once", w.word),
                ));
            }
        }
        self.check_collection(user_id, collection_id).await?;

        let scope = WordScope::new(user_id, collection_id);
        let terms: Vec<String> = words.iter().map(|w| w.word.clone()).collect();
        self.ensure_terms_free(scope, &terms, None).await?;

        let created = self
            .repo
            .bulk_create(scope, &words)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;

        info!(created = created.len(), "Words created");
        Ok(created)
    }

    /// # Errors
    /// `NotFound` when the word is not in the collection.
    pub async fn get(&self, user_id: i64, collection_id: i64, id: &str) -> Result<Word, DomainError> {
        require_positive_id("collectionId", collection_id)?;
        require_word_id(id)?;
        self.check_collection(user_id, collection_id).await?;
        self.repo
            .get_by_id(WordScope::new(user_id, collection_id), id)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?
            .ok_or_else(|| DomainError::not_found("Word", id))
    }

    /// # Errors
    /// Search failures.
    pub async fn list(
        &self,
        user_id: i64,
        collection_id: i64,
        page: PageRequest,
    ) -> Result<WordsPage, DomainError> {
        require_positive_id("collectionId", collection_id)?;
        self.check_collection(user_id, collection_id).await?;

        let (from, size) = (page.offset(), page.limit(self.config.words_unpaged_cap));
        debug!(from, size, "Listing words");
        self.repo
            .list(WordScope::new(user_id, collection_id), from, size)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))
    }

    /// Overwrite a word's content, keeping its id, collection and creation time.
    ///
    /// # Errors
    /// `NotFound`, `Conflict` when renamed onto an existing term, search failures.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: i64,
        collection_id: i64,
        id: &str,
        patch: WordPatch,
    ) -> Result<Word, DomainError> {
        let existing = self.get(user_id, collection_id, id).await?;
        let word = patch.word.trim().to_owned();
        require_term("word", &word)?;

        let scope = WordScope::new(user_id, collection_id);
        if word != existing.word {
            self.ensure_terms_free(scope, std::slice::from_ref(&word), Some(id))
                .await?;
        }

        let updated = Word {
            id: existing.id,
            collection_id: existing.collection_id,
            word,
            translation: patch.translation.trim().to_owned(),
            part_of_speech: patch.part_of_speech.trim().to_owned(),
            sentence: patch.sentence.trim().to_owned(),
            created_at: existing.created_at,
        };
        self.repo
            .update(scope, &updated)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;

        info!(word_id = %updated.id, "Word updated");
        Ok(updated)
    }

    /// Deleting a missing word succeeds.
    ///
    /// # Errors
    /// Search failures.
    pub async fn delete(&self, user_id: i64, collection_id: i64, id: &str) -> Result<(), DomainError> {
        require_positive_id("collectionId", collection_id)?;
        require_word_id(id)?;
        self.check_collection(user_id, collection_id).await?;
        self.repo
            .delete(WordScope::new(user_id, collection_id), id)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;
        info!(word_id = %id, "Word deleted");
        Ok(())
    }

    /// Translate one term; `index` is echoed back for client-side ordering.
    ///
    /// # Errors
    /// Validation failures for missing or unsupported codes, upstream failures.
    pub async fn translate(
        &self,
        text: &str,
        index: i64,
        lang_from: Option<&str>,
        lang_to: Option<&str>,
    ) -> Result<TranslatedWord, DomainError> {
        let source = language_param("langFrom", lang_from)?;
        let target = language_param("langTo", lang_to)?;
        require_non_empty("word", text)?;

        let translated = self
            .translator
            .translate(text.trim(), source, target)
            .await
            .map_err(|e| DomainError::upstream(format!("translation failed: {e:#}")))?;

        Ok(TranslatedWord {
            word: translated,
            index,
        })
    }

    async fn check_collection(&self, user_id: i64, collection_id: i64) -> Result<(), DomainError> {
        if !self.config.enforce_collection_ownership {
            return Ok(());
        }
        let collection = self
            .collections
            .find_by_id(collection_id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        match collection {
            Some(c) if c.owner_id == user_id => Ok(()),
            _ => Err(DomainError::not_found("Collection", collection_id)),
        }
    }

    async fn ensure_terms_free(
        &self,
        scope: WordScope,
        terms: &[String],
        except_id: Option<&str>,
    ) -> Result<(), DomainError> {
        let existing = self
            .repo
            .find_by_terms(scope, terms)
            .await
            .map_err(|e| DomainError::search(format!("{e:#}")))?;

        let taken: Vec<&str> = existing
            .iter()
            .filter(|w| Some(w.id.as_str()) != except_id)
            .map(|w| w.word.as_str())
            .collect();
        if taken.is_empty() {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "word already exists in collection: {}",
                taken.join(", ")
            )))
        }
    }
}

fn normalize(new: NewWord) -> NewWord {
    NewWord {
        collection_id: new.collection_id,
        word: new.word.trim().to_owned(),
        translation: new.translation.trim().to_owned(),
        part_of_speech: new.part_of_speech.trim().to_owned(),
        sentence: new.sentence.trim().to_owned(),
    }
}

fn validate_new_word(new: &NewWord) -> Result<(), DomainError> {
    require_positive_id("collectionId", new.collection_id)?;
    require_term("word", &new.word)
}

/// Longer terms would fall out of the exact-term index used for duplicate checks.
fn require_term(field: &str, term: &str) -> Result<(), DomainError> {
    require_non_empty(field, term)?;
    if term.chars().count() > Word::MAX_TERM_CHARS {
        return Err(DomainError::validation(
            field,
            format!("must be at most {} characters", Word::MAX_TERM_CHARS),
        ));
    }
    Ok(())
}

fn require_word_id(id: &str) -> Result<(), DomainError> {
    if !Word::is_valid_id(id) {
        return Err(DomainError::validation(
            "id",
            "must contain only letters, digits, '-' or '_'",
        ));
    }
    Ok(())
}

fn language_param(field: &str, value: Option<&str>) -> Result<&'static str, DomainError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(field, "is required"))?;
    provider_language_code(value)
        .ok_or_else(|| DomainError::validation(field, format!("unsupported language '{value}'")))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::super::test_support::TestEnv;
    use super::*;

    fn new_word(collection_id: i64, word: &str) -> NewWord {
        NewWord {
            collection_id,
            word: word.to_owned(),
            translation: format!("{word}-t"),
            part_of_speech: "noun".to_owned(),
            sentence: String::new(),
        }
    }

    #[test]
    fn ukrainian_code_is_mapped() {
        assert_eq!(provider_language_code("ua"), Some("uk"));
        assert_eq!(provider_language_code("EN"), Some("en"));
        assert_eq!(provider_language_code("xx"), None);
    }

    #[test]
    fn search_query_requires_field_before_text() {
        assert!(search_settings_from_query(None, Some("gat"), None).is_err());
        assert!(search_settings_from_query(Some("created_at"), Some("gat"), None).is_err());
        assert_eq!(
            search_settings_from_query(Some("word"), Some(""), None).unwrap(),
            None
        );

        let settings = search_settings_from_query(Some("word"), Some("gat"), Some("noun, verb,"))
            .unwrap()
            .unwrap();
        assert_eq!(settings.search_by, SearchField::Word);
        assert_eq!(settings.parts_of_speech, vec!["noun", "verb"]);
    }

    #[tokio::test]
    async fn duplicate_term_is_rejected_without_write() {
        let env = TestEnv::new();
        let svc = env.services();
        svc.words.create(1, new_word(3, "gato")).await.unwrap();

        let err = svc.words.create(1, new_word(3, "gato")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(env.words.count_in(WordScope::new(1, 3)), 1);

        // Same term in another collection is fine.
        svc.words.create(1, new_word(4, "gato")).await.unwrap();
    }

    #[tokio::test]
    async fn bulk_is_all_or_nothing() {
        let env = TestEnv::new();
        let svc = env.services();
        svc.words.create(1, new_word(3, "perro")).await.unwrap();

        let batch = vec![new_word(0, "gato"), new_word(0, "perro"), new_word(0, "raton")];
        let err = svc.words.bulk_create(1, 3, batch).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m.contains("perro")));
        assert_eq!(env.words.count_in(WordScope::new(1, 3)), 1);

        let created = svc
            .words
            .bulk_create(1, 3, vec![new_word(0, "gato"), new_word(0, "raton")])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|w| w.collection_id == 3));
    }

    #[tokio::test]
    async fn bulk_rejects_empty_and_repeated_batches() {
        let env = TestEnv::new();
        let svc = env.services();

        assert!(matches!(
            svc.words.bulk_create(1, 3, Vec::new()).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            svc.words
                .bulk_create(1, 3, vec![new_word(0, "gato"), new_word(0, "gato")])
                .await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn update_preserves_collection_and_creation_time() {
        let env = TestEnv::new();
        let svc = env.services();
        let original = svc.words.create(1, new_word(3, "gato")).await.unwrap();

        let updated = svc
            .words
            .update(
                1,
                3,
                &original.id,
                WordPatch {
                    word: "gata".to_owned(),
                    translation: "she-cat".to_owned(),
                    part_of_speech: "noun".to_owned(),
                    sentence: "La gata".to_owned(),
                },
            )
            .await
            .unwrap();

        let fetched = svc.words.get(1, 3, &original.id).await.unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(fetched.collection_id, 3);
        assert_eq!(fetched.created_at, original.created_at);
        assert_eq!(fetched.translation, "she-cat");
    }

    #[tokio::test]
    async fn update_onto_existing_term_conflicts() {
        let env = TestEnv::new();
        let svc = env.services();
        let gato = svc.words.create(1, new_word(3, "gato")).await.unwrap();
        svc.words.create(1, new_word(3, "perro")).await.unwrap();

        let err = svc
            .words
            .update(
                1,
                3,
                &gato.id,
                WordPatch {
                    word: "perro".to_owned(),
                    translation: String::new(),
                    part_of_speech: String::new(),
                    sentence: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_word_is_not_found_and_delete_is_idempotent() {
        let env = TestEnv::new();
        let svc = env.services();

        assert!(matches!(
            svc.words.get(1, 3, "missing").await,
            Err(DomainError::NotFound { .. })
        ));
        svc.words.delete(1, 3, "missing").await.unwrap();
    }

    #[tokio::test]
    async fn malformed_word_ids_are_rejected_before_lookup() {
        let env = TestEnv::new();
        let svc = env.services();
        let victim = svc.words.create(1, new_word(5, "victim")).await.unwrap();

        for id in ["../x", "../../collection_words-1-5/_doc/w1", "a?b", ""] {
            assert!(matches!(
                svc.words.get(1, 3, id).await,
                Err(DomainError::Validation { .. })
            ));
            assert!(matches!(
                svc.words.delete(1, 3, id).await,
                Err(DomainError::Validation { .. })
            ));
        }
        assert!(matches!(
            svc.words
                .update(
                    1,
                    3,
                    "../w1",
                    WordPatch {
                        word: "x".to_owned(),
                        translation: String::new(),
                        part_of_speech: String::new(),
                        sentence: String::new(),
                    },
                )
                .await,
            Err(DomainError::Validation { .. })
        ));
        assert_eq!(svc.words.get(1, 5, &victim.id).await.unwrap(), victim);
    }

    #[tokio::test]
    async fn terms_longer_than_the_exact_index_are_rejected() {
        let env = TestEnv::new();
        let svc = env.services();
        let longest = "ñ".repeat(Word::MAX_TERM_CHARS);
        let too_long = "a".repeat(Word::MAX_TERM_CHARS + 1);

        let kept = svc.words.create(1, new_word(3, &longest)).await.unwrap();
        assert!(matches!(
            svc.words.create(1, new_word(3, &too_long)).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            svc.words.bulk_create(1, 3, vec![new_word(0, &too_long)]).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            svc.words
                .update(
                    1,
                    3,
                    &kept.id,
                    WordPatch {
                        word: too_long,
                        translation: String::new(),
                        part_of_speech: String::new(),
                        sentence: String::new(),
                    },
                )
                .await,
            Err(DomainError::Validation { .. })
        ));
        assert_eq!(env.words.count_in(WordScope::new(1, 3)), 1);
    }

    #[tokio::test]
    async fn listing_uses_one_based_pages_and_cap() {
        let env = TestEnv::with_config(|cfg| cfg.words_unpaged_cap = 3);
        let svc = env.services();
        for term in ["a", "b", "c", "d", "e"] {
            svc.words.create(1, new_word(3, term)).await.unwrap();
        }

        let unpaged = svc.words.list(1, 3, PageRequest::UNPAGED).await.unwrap();
        assert_eq!(unpaged.words.len(), 3);
        assert_eq!(unpaged.total, 5);

        let second = svc
            .words
            .list(1, 3, PageRequest::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(env.words.last_window(), Some((2, 2)));
        assert_eq!(second.words.len(), 2);
    }

    #[tokio::test]
    async fn translate_maps_codes_and_echoes_index() {
        let env = TestEnv::new();
        let svc = env.services();

        let out = svc
            .words
            .translate("cat", 4, Some("en"), Some("ua"))
            .await
            .unwrap();
        assert_eq!(out.index, 4);
        assert_eq!(out.word, "cat[en->uk]");

        assert!(matches!(
            svc.words.translate("cat", 0, None, Some("en")).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            svc.words.translate("cat", 0, Some("en"), Some("tlh")).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn ownership_enforcement_guards_word_access() {
        let env = TestEnv::with_config(|cfg| cfg.enforce_collection_ownership = true);
        let svc = env.services();
        let c = svc
            .collections
            .create(
                1,
                vocabulary_sdk::NewCollection {
                    name: "Mine".to_owned(),
                    lang_from: "es".to_owned(),
                    lang_to: "en".to_owned(),
                },
            )
            .await
            .unwrap();

        svc.words.create(1, new_word(c.id, "gato")).await.unwrap();
        assert!(matches!(
            svc.words.create(2, new_word(c.id, "perro")).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
