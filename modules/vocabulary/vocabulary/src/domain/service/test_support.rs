//! In-memory fakes for service tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use time::OffsetDateTime;
use vocabulary_sdk::{
    Collection, NewCollection, NewWord, SearchField, SearchSettings, StatInterval, TimeBucket,
    User, UserSettings, Word, WordsPage,
};

use super::{AppServices, Dependencies, ServiceConfig};
use crate::domain::ports::{ObjectStorage, PdfRenderer, Translator, WordRow};
use crate::domain::repos::{
    CollectionsRepository, SearchIndexProvisioner, StoredUser, UsersRepository, WordScope,
    WordsRepository,
};
use crate::infra::auth::{BcryptHasher, JwtTokenService};

#[derive(Default)]
pub struct FakeCollections {
    rows: Mutex<Vec<Collection>>,
    next_id: AtomicI64,
}

impl FakeCollections {
    pub fn contains_name(&self, name: &str) -> bool {
        self.rows.lock().unwrap().iter().any(|c| c.name == name)
    }

    fn owner_of(&self, id: i64) -> Option<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.owner_id)
    }
}

#[async_trait]
impl CollectionsRepository for FakeCollections {
    async fn create(&self, owner_id: i64, new: &NewCollection) -> anyhow::Result<Collection> {
        let collection = Collection {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: new.name.clone(),
            owner_id,
            lang_from: new.lang_from.clone(),
            lang_to: new.lang_to.clone(),
            created_at: OffsetDateTime::now_utc(),
            pdf_url: None,
            words: Vec::new(),
        };
        self.rows.lock().unwrap().push(collection.clone());
        Ok(collection)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Collection>> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Collection>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Collection>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> anyhow::Result<Vec<Collection>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_name(&self, id: i64, name: &str) -> anyhow::Result<Option<Collection>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|c| c.id == id).map(|c| {
            c.name = name.to_owned();
            c.clone()
        }))
    }

    async fn set_pdf_url(&self, id: i64, url: &str) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(c) = rows.iter_mut().find(|c| c.id == id) {
            c.pdf_url = Some(url.to_owned());
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() != before)
    }
}

pub struct FakeUsers {
    rows: Mutex<Vec<StoredUser>>,
    next_id: AtomicI64,
    collections: Arc<FakeCollections>,
    fail_owner_lookups: AtomicBool,
}

impl FakeUsers {
    fn new(collections: Arc<FakeCollections>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(0),
            collections,
            fail_owner_lookups: AtomicBool::new(false),
        }
    }

    pub fn contains_email(&self, email: &str) -> bool {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.user.email == email)
    }

    pub fn fail_owner_lookups(&self) {
        self.fail_owner_lookups.store(true, Ordering::SeqCst);
    }

    /// Grant the super-user flag to an existing user.
    pub fn promote(&self, user_id: i64) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|u| u.user.id == user_id) {
            row.user.is_super = true;
        }
    }
}

#[async_trait]
impl UsersRepository for FakeUsers {
    async fn create_with_settings(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User {
            id,
            name: name.to_owned(),
            email: email.to_owned(),
            created_at: OffsetDateTime::now_utc(),
            is_super: false,
            settings: Some(UserSettings {
                id,
                user_id: id,
                language: String::new(),
            }),
        };
        self.rows.lock().unwrap().push(StoredUser {
            user: user.clone(),
            password_hash: password_hash.to_owned(),
        });
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn find_by_collection_id(&self, collection_id: i64) -> anyhow::Result<Option<User>> {
        if self.fail_owner_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("owner lookup unavailable"));
        }
        match self.collections.owner_of(collection_id) {
            Some(owner) => self.find_by_id(owner).await,
            None => Ok(None),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.user.clone())
            .collect())
    }

    async fn update_language(
        &self,
        user_id: i64,
        language: &str,
    ) -> anyhow::Result<Option<UserSettings>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .and_then(|u| u.user.settings.as_mut())
            .map(|s| {
                s.language = language.to_owned();
                s.clone()
            }))
    }
}

#[derive(Default)]
pub struct FakeWords {
    rows: Mutex<Vec<(WordScope, Word)>>,
    next_id: AtomicI64,
    failing_collections: Mutex<HashSet<i64>>,
    last_window: Mutex<Option<(u64, u64)>>,
}

impl FakeWords {
    pub fn count_in(&self, scope: WordScope) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == scope)
            .count()
    }

    pub fn fail_listing_for(&self, collection_id: i64) {
        self.failing_collections
            .lock()
            .unwrap()
            .insert(collection_id);
    }

    pub fn last_window(&self) -> Option<(u64, u64)> {
        *self.last_window.lock().unwrap()
    }

    fn make(&self, new: &NewWord) -> Word {
        Word {
            id: format!("w{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            collection_id: new.collection_id,
            word: new.word.clone(),
            translation: new.translation.clone(),
            part_of_speech: new.part_of_speech.clone(),
            sentence: new.sentence.clone(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

fn is_hit(word: &Word, settings: &SearchSettings) -> bool {
    let field = match settings.search_by {
        SearchField::Word => &word.word,
        SearchField::Translation => &word.translation,
        SearchField::Sentence => &word.sentence,
    };
    let text_ok = field
        .to_lowercase()
        .contains(&settings.text.to_lowercase());
    let pos_ok = settings.parts_of_speech.is_empty()
        || settings.parts_of_speech.contains(&word.part_of_speech);
    text_ok && pos_ok
}

#[async_trait]
impl WordsRepository for FakeWords {
    async fn create(&self, scope: WordScope, new: &NewWord) -> anyhow::Result<Word> {
        let word = self.make(new);
        self.rows.lock().unwrap().push((scope, word.clone()));
        Ok(word)
    }

    async fn bulk_create(&self, scope: WordScope, words: &[NewWord]) -> anyhow::Result<Vec<Word>> {
        let created: Vec<Word> = words.iter().map(|w| self.make(w)).collect();
        self.rows
            .lock()
            .unwrap()
            .extend(created.iter().cloned().map(|w| (scope, w)));
        Ok(created)
    }

    async fn find_by_terms(&self, scope: WordScope, terms: &[String]) -> anyhow::Result<Vec<Word>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, w)| *s == scope && terms.contains(&w.word))
            .map(|(_, w)| w.clone())
            .collect())
    }

    async fn get_by_id(&self, scope: WordScope, id: &str) -> anyhow::Result<Option<Word>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|(s, w)| *s == scope && w.id == id)
            .map(|(_, w)| w.clone()))
    }

    async fn list(&self, scope: WordScope, from: u64, size: u64) -> anyhow::Result<WordsPage> {
        if self
            .failing_collections
            .lock()
            .unwrap()
            .contains(&scope.collection_id)
        {
            return Err(anyhow!("index_not_found_exception"));
        }
        *self.last_window.lock().unwrap() = Some((from, size));
        let all: Vec<Word> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == scope)
            .map(|(_, w)| w.clone())
            .collect();
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
        if let Some((_, stored)) = rows
            .iter_mut()
            .find(|(s, w)| *s == scope && w.id == word.id)
        {
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
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, w)| *s == scope && is_hit(w, settings))
            .map(|(_, w)| w.clone())
            .collect())
    }

    async fn search_all(
        &self,
        user_ids: &[i64],
        settings: &SearchSettings,
    ) -> anyhow::Result<Vec<Word>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, w)| user_ids.contains(&s.user_id) && is_hit(w, settings))
            .map(|(_, w)| w.clone())
            .collect())
    }

    async fn count_all(&self, user_ids: &[i64]) -> anyhow::Result<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| user_ids.contains(&s.user_id))
            .count() as u64)
    }

    async fn count_per_interval(
        &self,
        user_ids: &[i64],
        interval: StatInterval,
    ) -> anyhow::Result<Vec<TimeBucket>> {
        let count = self.count_all(user_ids).await?;
        Ok(vec![TimeBucket {
            date: format!("current {}", interval.as_str()),
            count,
        }])
    }
}

#[derive(Default)]
pub struct FakeIndex {
    user_indices: Mutex<HashSet<i64>>,
    aliases: Mutex<HashSet<(i64, i64)>>,
    fail_user_index: AtomicBool,
    fail_alias: AtomicBool,
}

impl FakeIndex {
    pub fn has_user_index(&self, user_id: i64) -> bool {
        self.user_indices.lock().unwrap().contains(&user_id)
    }

    pub fn has_alias(&self, user_id: i64, collection_id: i64) -> bool {
        self.aliases
            .lock()
            .unwrap()
            .contains(&(user_id, collection_id))
    }

    pub fn fail_next_user_index(&self) {
        self.fail_user_index.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_alias(&self) {
        self.fail_alias.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SearchIndexProvisioner for FakeIndex {
    async fn ensure_user_index(&self, user_id: i64) -> anyhow::Result<()> {
        if self.fail_user_index.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("cluster unavailable"));
        }
        self.user_indices.lock().unwrap().insert(user_id);
        Ok(())
    }

    async fn ensure_collection_alias(&self, user_id: i64, collection_id: i64) -> anyhow::Result<()> {
        if self.fail_alias.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("cluster unavailable"));
        }
        self.aliases.lock().unwrap().insert((user_id, collection_id));
        Ok(())
    }

    async fn remove_collection_alias(&self, user_id: i64, collection_id: i64) -> anyhow::Result<()> {
        self.aliases
            .lock()
            .unwrap()
            .remove(&(user_id, collection_id));
        Ok(())
    }
}

pub struct EchoTranslator;

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        Ok(format!("{text}[{source}->{target}]"))
    }
}

#[derive(Default)]
pub struct FakeStorage {
    keys: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeStorage {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn fail_uploads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_public(
        &self,
        key: &str,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> anyhow::Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("access denied"));
        }
        self.keys.lock().unwrap().push(key.to_owned());
        Ok(format!("https://storage.test/{key}"))
    }
}

#[derive(Default)]
pub struct RecordingPdf {
    rows: Mutex<Vec<(String, String)>>,
}

impl RecordingPdf {
    pub fn last_rows(&self) -> Vec<(String, String)> {
        self.rows.lock().unwrap().clone()
    }
}

impl PdfRenderer for RecordingPdf {
    fn render_word_table(&self, _title: &str, rows: &[WordRow]) -> anyhow::Result<Vec<u8>> {
        *self.rows.lock().unwrap() = rows
            .iter()
            .map(|r| (r.word.clone(), r.translation.clone()))
            .collect();
        Ok(b"%PDF-1.3 test".to_vec())
    }
}

pub struct TestEnv {
    pub users: Arc<FakeUsers>,
    pub collections: Arc<FakeCollections>,
    pub words: Arc<FakeWords>,
    pub index: Arc<FakeIndex>,
    pub storage: Arc<FakeStorage>,
    pub pdf: Arc<RecordingPdf>,
    pub tokens: Arc<JwtTokenService>,
    config: ServiceConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut ServiceConfig)) -> Self {
        let mut config = ServiceConfig::default();
        tweak(&mut config);
        let collections = Arc::new(FakeCollections::default());
        Self {
            users: Arc::new(FakeUsers::new(collections.clone())),
            collections,
            words: Arc::new(FakeWords::default()),
            index: Arc::new(FakeIndex::default()),
            storage: Arc::new(FakeStorage::default()),
            pdf: Arc::new(RecordingPdf::default()),
            tokens: Arc::new(JwtTokenService::new("test-secret")),
            config,
        }
    }

    pub fn services(&self) -> AppServices {
        let deps = Dependencies {
            users: self.users.clone(),
            collections: self.collections.clone(),
            words: self.words.clone(),
            index: self.index.clone(),
            hasher: Arc::new(BcryptHasher::new(4)),
            tokens: self.tokens.clone(),
            translator: Arc::new(EchoTranslator),
            storage: self.storage.clone(),
            pdf: self.pdf.clone(),
        };
        AppServices::new(&deps, &self.config)
    }
}
