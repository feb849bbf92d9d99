#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::Router;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use vocabulary::domain::repos::{SearchIndexProvisioner, WordScope, WordsRepository};
use vocabulary::domain::service::Dependencies;
use vocabulary::infra::auth::{BcryptHasher, JwtTokenService};
use vocabulary::infra::object_storage::DisabledStorage;
use vocabulary::infra::pdf::PrintPdfRenderer;
use vocabulary::infra::storage::{SeaOrmCollectionsRepository, SeaOrmUsersRepository};
use vocabulary::infra::translate::DisabledTranslator;
use vocabulary::{VocabularyConfig, VocabularyModule};
use vocabulary_sdk::{
    NewWord, SearchField, SearchSettings, StatInterval, TimeBucket, Word, WordsPage,
};

/// Word store kept in memory in place of Elasticsearch.
#[derive(Default)]
pub struct MemoryWords {
    rows: Mutex<Vec<(WordScope, Word)>>,
    next_id: AtomicU64,
}

impl MemoryWords {
    fn build(&self, new: &NewWord) -> Word {
        Word {
            id: format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            collection_id: new.collection_id,
            word: new.word.clone(),
            translation: new.translation.clone(),
            part_of_speech: new.part_of_speech.clone(),
            sentence: new.sentence.clone(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn select(&self, keep: impl Fn(&WordScope, &Word) -> bool) -> Vec<Word> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, w)| keep(s, w))
            .map(|(_, w)| w.clone())
            .collect()
    }
}

fn hit(word: &Word, settings: &SearchSettings) -> bool {
    let field = match settings.search_by {
        SearchField::Word => &word.word,
        SearchField::Translation => &word.translation,
        SearchField::Sentence => &word.sentence,
    };
    field.to_lowercase().contains(&settings.text.to_lowercase())
        && (settings.parts_of_speech.is_empty()
            || settings.parts_of_speech.contains(&word.part_of_speech))
}

#[async_trait]
impl WordsRepository for MemoryWords {
    async fn create(&self, scope: WordScope, new: &NewWord) -> anyhow::Result<Word> {
        let word = self.build(new);
        self.rows.lock().unwrap().push((scope, word.clone()));
        Ok(word)
    }

    async fn bulk_create(&self, scope: WordScope, words: &[NewWord]) -> anyhow::Result<Vec<Word>> {
        let mut created = Vec::with_capacity(words.len());
        for new in words {
            created.push(self.create(scope, new).await?);
        }
        Ok(created)
    }

    async fn find_by_terms(&self, scope: WordScope, terms: &[String]) -> anyhow::Result<Vec<Word>> {
        Ok(self.select(|s, w| *s == scope && terms.contains(&w.word)))
    }

    async fn get_by_id(&self, scope: WordScope, id: &str) -> anyhow::Result<Option<Word>> {
        Ok(self.select(|s, w| *s == scope && w.id == id).pop())
    }

    async fn list(&self, scope: WordScope, from: u64, size: u64) -> anyhow::Result<WordsPage> {
        let all = self.select(|s, _| *s == scope);
        let total = all.len() as u64;
        let words = all
            .into_iter()
            .skip(usize::try_from(from)?)
            .take(usize::try_from(size)?)
            .collect();
        Ok(WordsPage { words, total })
    }

    async fn update(&self, scope: WordScope, word: &Word) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some((_, stored)) = rows.iter_mut().find(|(s, w)| *s == scope && w.id == word.id) {
            *stored = word.clone();
        }
        Ok(())
    }

    async fn delete(&self, scope: WordScope, id: &str) -> anyhow::Result<()> {
        self.rows
            .lock()
            .unwrap()
            .retain(|(s, w)| !(*s == scope && w.id == id));
        Ok(())
    }

    async fn delete_all(&self, scope: WordScope) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(s, _)| *s != scope);
        Ok((before - rows.len()) as u64)
    }

    async fn search(&self, scope: WordScope, settings: &SearchSettings) -> anyhow::Result<Vec<Word>> {
        Ok(self.select(|s, w| *s == scope && hit(w, settings)))
    }

    async fn search_all(
        &self,
        user_ids: &[i64],
        settings: &SearchSettings,
    ) -> anyhow::Result<Vec<Word>> {
        Ok(self.select(|s, w| user_ids.contains(&s.user_id) && hit(w, settings)))
    }

    async fn count_all(&self, user_ids: &[i64]) -> anyhow::Result<u64> {
        Ok(self.select(|s, _| user_ids.contains(&s.user_id)).len() as u64)
    }

    async fn count_per_interval(
        &self,
        user_ids: &[i64],
        interval: StatInterval,
    ) -> anyhow::Result<Vec<TimeBucket>> {
        Ok(vec![TimeBucket {
            date: interval.as_str().to_owned(),
            count: self.count_all(user_ids).await?,
        }])
    }
}

/// Index provisioning that always succeeds.
pub struct NoopIndex;

#[async_trait]
impl SearchIndexProvisioner for NoopIndex {
    async fn ensure_user_index(&self, _user_id: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn ensure_collection_alias(&self, _user_id: i64, _collection_id: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove_collection_alias(&self, _user_id: i64, _collection_id: i64) -> anyhow::Result<()> {
        Ok(())
    }
}

pub async fn sqlite_db() -> DatabaseConnection {
    let db = sea_orm::Database::connect(
        // One pooled connection, so every query sees the same in-memory database.
        sea_orm::ConnectOptions::new("sqlite::memory:")
            .max_connections(1)
            .min_connections(1)
            .to_owned(),
    )
    .await
    .unwrap();
    VocabularyModule::migrate(&db).await.unwrap();
    db
}

/// Full router over an in-memory SQLite database and in-memory words.
pub async fn test_router() -> Router {
    let db = sqlite_db().await;
    let deps = Dependencies {
        users: Arc::new(SeaOrmUsersRepository::new(db.clone())),
        collections: Arc::new(SeaOrmCollectionsRepository::new(db)),
        words: Arc::new(MemoryWords::default()),
        index: Arc::new(NoopIndex),
        hasher: Arc::new(BcryptHasher::new(4)),
        tokens: Arc::new(JwtTokenService::new("integration-secret")),
        translator: Arc::new(DisabledTranslator),
        storage: Arc::new(DisabledStorage),
        pdf: Arc::new(PrintPdfRenderer),
    };
    VocabularyModule::from_dependencies(&deps, &VocabularyConfig::default()).router()
}

pub async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
