use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use vocabulary_sdk::{NewWord, PageRequest};

use super::{json_body, path_args, problem_at, query_args};
use crate::api::rest::auth::CurrentUser;
use crate::api::rest::dto::{
    BulkWordsRequest, CreateWordRequest, MessageResponse, PageQuery, TranslateQuery,
    TranslateRequest, UpdateWordRequest, WordMessageResponse, WordResponse,
    WordsMessageResponse, WordsPageResponse,
};
use crate::api::rest::error::{ApiResult, ErrorCode};
use crate::domain::service::WordsService;

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn create_word(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    body: Result<Json<CreateWordRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(body, &uri)?;
    let word = svc
        .create(user.id, req.into())
        .await
        .map_err(problem_at(&uri))?;
    Ok((
        StatusCode::CREATED,
        Json(WordMessageResponse {
            message: "success".to_owned(),
            word: word.into(),
        }),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn create_words(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    body: Result<Json<BulkWordsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(body, &uri)?;
    let words: Vec<NewWord> = req.words.into_iter().map(Into::into).collect();
    let created = svc
        .bulk_create(user.id, req.collection_id, words)
        .await
        .map_err(problem_at(&uri))?;
    Ok((
        StatusCode::CREATED,
        Json(WordsMessageResponse {
            message: "success".to_owned(),
            words: created.into_iter().map(Into::into).collect(),
        }),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn get_word(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ApiResult<Json<WordResponse>> {
    let (id, collection_id) = path_args(path, &uri)?;
    let word = svc
        .get(user.id, collection_id, &id)
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(WordResponse { word: word.into() }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn update_word(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    path: Result<Path<(String, i64)>, PathRejection>,
    body: Result<Json<UpdateWordRequest>, JsonRejection>,
) -> ApiResult<Json<WordMessageResponse>> {
    let (id, collection_id) = path_args(path, &uri)?;
    let req = json_body(body, &uri)?;
    let word = svc
        .update(user.id, collection_id, &id, req.into())
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(WordMessageResponse {
        message: "success update".to_owned(),
        word: word.into(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn delete_word(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let (id, collection_id) = path_args(path, &uri)?;
    svc.delete(user.id, collection_id, &id)
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(MessageResponse::new("success")))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn list_words(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<WordsPageResponse>> {
    let collection_id = path_args(path, &uri)?;
    let query = query_args(query, &uri)?;
    let page = PageRequest::new(query.size.unwrap_or(0), query.page.unwrap_or(0)).ok_or_else(|| {
        ErrorCode::Validation
            .with_message(format!(
                "size and page must both be zero, or both positive with size * page at most {}",
                PageRequest::MAX_WINDOW
            ))
            .with_instance(uri.path())
    })?;

    let result = svc
        .list(user.id, collection_id, page)
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(WordsPageResponse {
        words: result.words.into_iter().map(Into::into).collect(),
        total_words: result.total,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn translate_word(
    Extension(svc): Extension<Arc<WordsService>>,
    uri: Uri,
    query: Result<Query<TranslateQuery>, QueryRejection>,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<Json<TranslateRequest>> {
    let query = query_args(query, &uri)?;
    let req = json_body(body, &uri)?;
    let translated = svc
        .translate(
            &req.word,
            req.index,
            query.lang_from.as_deref(),
            query.lang_to.as_deref(),
        )
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(translated.into()))
}
