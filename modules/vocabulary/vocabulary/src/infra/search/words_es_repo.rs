//! Elasticsearch-backed word store. Each collection is addressed through its alias.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::warn;
use vocabulary_sdk::{
    NewWord, SearchField, SearchSettings, StatInterval, TimeBucket, Word, WordsPage,
};

use super::client::ElasticClient;
use super::naming::{collection_alias, document_path, user_indices};
use crate::domain::repos::{WordScope, WordsRepository};

/// Upper bound on hits returned by a search request.
const MAX_SEARCH_HITS: usize = 1000;

#[derive(Debug, Serialize, Deserialize)]
struct WordDocument {
    collection_id: i64,
    word: String,
    translation: String,
    part_of_speech: String,
    scentance: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl WordDocument {
    fn new(new: &NewWord, created_at: OffsetDateTime) -> Self {
        Self {
            collection_id: new.collection_id,
            word: new.word.clone(),
            translation: new.translation.clone(),
            part_of_speech: new.part_of_speech.clone(),
            scentance: new.sentence.clone(),
            created_at,
        }
    }

    fn from_word(word: &Word) -> Self {
        Self {
            collection_id: word.collection_id,
            word: word.word.clone(),
            translation: word.translation.clone(),
            part_of_speech: word.part_of_speech.clone(),
            scentance: word.sentence.clone(),
            created_at: word.created_at,
        }
    }

    fn into_word(self, id: String) -> Word {
        Word {
            id,
            collection_id: self.collection_id,
            word: self.word,
            translation: self.translation,
            part_of_speech: self.part_of_speech,
            sentence: self.scentance,
            created_at: self.created_at,
        }
    }
}

fn search_field(field: SearchField) -> &'static str {
    match field {
        SearchField::Word => "word.keyword",
        SearchField::Translation => "translation",
        SearchField::Sentence => "scentance",
    }
}

fn escape_wildcard(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn search_query(settings: &SearchSettings) -> Value {
    let mut wildcard = serde_json::Map::new();
    wildcard.insert(
        search_field(settings.search_by).to_owned(),
        json!({
            "value": format!("*{}*", escape_wildcard(&settings.text)),
            "case_insensitive": true
        }),
    );
    let mut must = vec![json!({ "wildcard": wildcard })];
    if !settings.parts_of_speech.is_empty() {
        must.push(json!({ "terms": { "part_of_speech": settings.parts_of_speech } }));
    }
    json!({ "bool": { "must": must } })
}

/// Decode `hits.hits`, skipping documents that do not parse.
fn parse_hits(body: &Value) -> Vec<Word> {
    let Some(hits) = body["hits"]["hits"].as_array() else {
        return Vec::new();
    };
    hits.iter()
        .filter_map(|hit| {
            let id = hit["_id"].as_str()?.to_owned();
            match serde_json::from_value::<WordDocument>(hit["_source"].clone()) {
                Ok(doc) => Some(doc.into_word(id)),
                Err(e) => {
                    warn!(%id, error = %e, "Skipping malformed word document");
                    None
                }
            }
        })
        .collect()
}

pub struct ElasticWordsRepository {
    client: Arc<ElasticClient>,
}

impl ElasticWordsRepository {
    #[must_use]
    pub fn new(client: Arc<ElasticClient>) -> Self {
        Self { client }
    }

    async fn search_alias(&self, scope: WordScope, body: &Value) -> anyhow::Result<Value> {
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        Ok(self
            .client
            .send_json(Method::POST, &format!("/{alias}/_search"), Some(body))
            .await?)
    }
}

#[async_trait]
impl WordsRepository for ElasticWordsRepository {
    async fn create(&self, scope: WordScope, new: &NewWord) -> anyhow::Result<Word> {
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        let doc = WordDocument::new(new, OffsetDateTime::now_utc());
        let response = self
            .client
            .send_json(
                Method::POST,
                &format!("/{alias}/_doc?refresh=true"),
                Some(&serde_json::to_value(&doc)?),
            )
            .await?;
        let id = response["_id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("index response carries no document id"))?
            .to_owned();
        Ok(doc.into_word(id))
    }

    async fn bulk_create(&self, scope: WordScope, words: &[NewWord]) -> anyhow::Result<Vec<Word>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        let now = OffsetDateTime::now_utc();
        let docs: Vec<WordDocument> = words.iter().map(|w| WordDocument::new(w, now)).collect();

        let mut body = String::new();
        for doc in &docs {
            let action = json!({ "index": { "_index": alias } });
            writeln!(body, "{action}")?;
            writeln!(body, "{}", serde_json::to_string(doc)?)?;
        }

        let response = self
            .client
            .send_ndjson("/_bulk?refresh=true", body)
            .await?;
        let items = response["items"].as_array().cloned().unwrap_or_default();
        if response["errors"].as_bool().unwrap_or(false) {
            let reason = items
                .iter()
                .find_map(|item| item["index"]["error"]["reason"].as_str())
                .unwrap_or("unknown bulk failure");
            anyhow::bail!("bulk indexing failed: {reason}");
        }
        if items.len() != docs.len() {
            anyhow::bail!(
                "bulk response has {} items for {} documents",
                items.len(),
                docs.len()
            );
        }

        docs.into_iter()
            .zip(items)
            .map(|(doc, item)| {
                let id = item["index"]["_id"]
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("bulk item carries no document id"))?
                    .to_owned();
                Ok(doc.into_word(id))
            })
            .collect()
    }

    async fn find_by_terms(&self, scope: WordScope, terms: &[String]) -> anyhow::Result<Vec<Word>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "size": terms.len(),
            "query": { "terms": { "word.keyword": terms } }
        });
        Ok(parse_hits(&self.search_alias(scope, &body).await?))
    }

    async fn get_by_id(&self, scope: WordScope, id: &str) -> anyhow::Result<Option<Word>> {
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        let path = document_path(&alias, "_doc", id)?;
        let response = match self.client.send_json(Method::GET, &path, None).await
        {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !response["found"].as_bool().unwrap_or(false) {
            return Ok(None);
        }

        let doc: WordDocument = serde_json::from_value(response["_source"].clone())?;
        // Document lookups bypass the alias filter.
        if doc.collection_id != scope.collection_id {
            return Ok(None);
        }
        Ok(Some(doc.into_word(id.to_owned())))
    }

    async fn list(&self, scope: WordScope, from: u64, size: u64) -> anyhow::Result<WordsPage> {
        let body = json!({
            "from": from,
            "size": size,
            "track_total_hits": true,
            "sort": [{ "created_at": { "order": "asc" } }],
            "query": { "match_all": {} }
        });
        let response = self.search_alias(scope, &body).await?;
        Ok(WordsPage {
            total: response["hits"]["total"]["value"].as_u64().unwrap_or(0),
            words: parse_hits(&response),
        })
    }

    async fn update(&self, scope: WordScope, word: &Word) -> anyhow::Result<()> {
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        let path = document_path(&alias, "_update", &word.id)?;
        let body = json!({ "doc": WordDocument::from_word(word) });
        self.client
            .send_json(Method::POST, &format!("{path}?refresh=true"), Some(&body))
            .await?;
        Ok(())
    }

    async fn delete(&self, scope: WordScope, id: &str) -> anyhow::Result<()> {
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        let path = document_path(&alias, "_doc", id)?;
        match self
            .client
            .send_json(Method::DELETE, &format!("{path}?refresh=true"), None)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all(&self, scope: WordScope) -> anyhow::Result<u64> {
        let alias = collection_alias(scope.user_id, scope.collection_id)?;
        let body = json!({ "query": { "term": { "collection_id": scope.collection_id } } });
        match self
            .client
            .send_json(
                Method::POST,
                &format!("/{alias}/_delete_by_query?refresh=true"),
                Some(&body),
            )
            .await
        {
            Ok(response) => Ok(response["deleted"].as_u64().unwrap_or(0)),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn search(&self, scope: WordScope, settings: &SearchSettings) -> anyhow::Result<Vec<Word>> {
        let body = json!({ "size": MAX_SEARCH_HITS, "query": search_query(settings) });
        Ok(parse_hits(&self.search_alias(scope, &body).await?))
    }

    async fn search_all(
        &self,
        user_ids: &[i64],
        settings: &SearchSettings,
    ) -> anyhow::Result<Vec<Word>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let indices = user_indices(user_ids)?;
        let body = json!({ "size": MAX_SEARCH_HITS, "query": search_query(settings) });
        let response = self
            .client
            .send_json(
                Method::POST,
                &format!("/{indices}/_search?ignore_unavailable=true"),
                Some(&body),
            )
            .await?;
        Ok(parse_hits(&response))
    }

    async fn count_all(&self, user_ids: &[i64]) -> anyhow::Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let indices = user_indices(user_ids)?;
        let response = self
            .client
            .send_json(
                Method::POST,
                &format!("/{indices}/_count?ignore_unavailable=true"),
                Some(&json!({ "query": { "match_all": {} } })),
            )
            .await?;
        Ok(response["count"].as_u64().unwrap_or(0))
    }

    async fn count_per_interval(
        &self,
        user_ids: &[i64],
        interval: StatInterval,
    ) -> anyhow::Result<Vec<TimeBucket>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let indices = user_indices(user_ids)?;
        let body = json!({
            "size": 0,
            "aggs": {
                "per_interval": {
                    "date_histogram": {
                        "field": "created_at",
                        "calendar_interval": interval.as_str(),
                        "min_doc_count": 1
                    }
                }
            }
        });
        let response = self
            .client
            .send_json(
                Method::POST,
                &format!("/{indices}/_search?ignore_unavailable=true"),
                Some(&body),
            )
            .await?;

        let buckets = response["aggregations"]["per_interval"]["buckets"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        Ok(buckets
            .iter()
            .map(|b| TimeBucket {
                date: b["key_as_string"]
                    .as_str()
                    .map_or_else(|| b["key"].to_string(), ToOwned::to_owned),
                count: b["doc_count"].as_u64().unwrap_or(0),
            })
            .collect())
    }
}
