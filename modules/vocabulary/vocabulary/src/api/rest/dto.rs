//! REST DTOs.
//!
//! JSON is camelCase. Request bodies accept the legacy `scentance` spelling for `sentence`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use vocabulary_sdk::{
    Collection, Creator, CreatorWord, NewCollection, NewUser, NewWord, TimeBucket, TranslatedWord,
    User, UserSettings, Word, WordPatch,
};

// === Users ===

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsDto {
    pub id: i64,
    pub user_id: i64,
    pub language: String,
}

impl From<UserSettings> for UserSettingsDto {
    fn from(s: UserSettings) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            language: s.language,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_super: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<UserSettingsDto>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            created_at: u.created_at,
            is_super: u.is_super,
            settings: u.settings.map(Into::into),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(r: RegisterRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedUserResponse {
    pub message: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user: UserDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub message: String,
    pub settings: UserSettingsDto,
}

// === Words ===

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WordDto {
    pub id: String,
    pub collection_id: i64,
    pub word: String,
    pub translation: String,
    pub part_of_speech: String,
    pub sentence: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Word> for WordDto {
    fn from(w: Word) -> Self {
        Self {
            id: w.id,
            collection_id: w.collection_id,
            word: w.word,
            translation: w.translation,
            part_of_speech: w.part_of_speech,
            sentence: w.sentence,
            created_at: w.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWordRequest {
    /// Ignored inside a bulk request; the batch's `collectionId` applies.
    #[serde(default)]
    pub collection_id: i64,
    pub word: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default, alias = "scentance")]
    pub sentence: String,
}

impl From<CreateWordRequest> for NewWord {
    fn from(r: CreateWordRequest) -> Self {
        Self {
            collection_id: r.collection_id,
            word: r.word,
            translation: r.translation,
            part_of_speech: r.part_of_speech,
            sentence: r.sentence,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkWordsRequest {
    pub collection_id: i64,
    pub words: Vec<CreateWordRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWordRequest {
    pub word: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default, alias = "scentance")]
    pub sentence: String,
}

impl From<UpdateWordRequest> for WordPatch {
    fn from(r: UpdateWordRequest) -> Self {
        Self {
            word: r.word,
            translation: r.translation,
            part_of_speech: r.part_of_speech,
            sentence: r.sentence,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranslateRequest {
    pub word: String,
    #[serde(default)]
    pub index: i64,
}

impl From<TranslatedWord> for TranslateRequest {
    fn from(t: TranslatedWord) -> Self {
        Self {
            word: t.word,
            index: t.index,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TranslateQuery {
    pub lang_from: Option<String>,
    pub lang_to: Option<String>,
}

/// `size=0&page=0` (or both absent) lists without paging.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub size: Option<u64>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// `word`, `translation` or `sentence`.
    pub search_by: Option<String>,
    pub text: Option<String>,
    /// Comma-separated part-of-speech tags.
    pub parts_of_speech: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WordResponse {
    pub word: WordDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WordMessageResponse {
    pub message: String,
    pub word: WordDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WordsMessageResponse {
    pub message: String,
    pub words: Vec<WordDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WordsResponse {
    pub words: Vec<WordDto>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WordsPageResponse {
    pub words: Vec<WordDto>,
    pub total_words: u64,
}

// === Collections ===

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDto {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub lang_from: String,
    pub lang_to: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub pdf_url: Option<String>,
    pub words: Vec<WordDto>,
}

impl From<Collection> for CollectionDto {
    fn from(c: Collection) -> Self {
        Self {
            id: c.id,
            name: c.name,
            owner_id: c.owner_id,
            lang_from: c.lang_from,
            lang_to: c.lang_to,
            created_at: c.created_at,
            pdf_url: c.pdf_url,
            words: c.words.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    pub name: String,
    pub lang_from: String,
    pub lang_to: String,
}

impl From<CreateCollectionRequest> for NewCollection {
    fn from(r: CreateCollectionRequest) -> Self {
        Self {
            name: r.name,
            lang_from: r.lang_from,
            lang_to: r.lang_to,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub collection: CollectionDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionMessageResponse {
    pub message: String,
    pub collection: CollectionDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionsResponse {
    pub collections: Vec<CollectionDto>,
}

// === Statistics ===

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PerTimeQuery {
    /// `minute`, `hour`, `day`, `week`, `month`, `quarter` or `year`.
    pub time: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeBucketDto {
    pub date: String,
    pub count: u64,
}

impl From<TimeBucket> for TimeBucketDto {
    fn from(b: TimeBucket) -> Self {
        Self {
            date: b.date,
            count: b.count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticResponse {
    pub statistic: Vec<TimeBucketDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatorDto {
    pub name: String,
    pub email: String,
}

impl From<Creator> for CreatorDto {
    fn from(c: Creator) -> Self {
        Self {
            name: c.name,
            email: c.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatorWordDto {
    pub word: WordDto,
    pub creator: Option<CreatorDto>,
}

impl From<CreatorWord> for CreatorWordDto {
    fn from(w: CreatorWord) -> Self {
        Self {
            word: w.word.into(),
            creator: w.creator.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatorWordsResponse {
    pub words: Vec<CreatorWordDto>,
}

// === Shared ===

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}
