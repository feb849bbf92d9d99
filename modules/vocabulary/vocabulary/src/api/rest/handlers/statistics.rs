//! Super-user aggregates. Routes are mounted behind `require_super_user`.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query};
use axum::http::Uri;
use axum::Json;

use super::{problem_at, query_args};
use crate::api::rest::dto::{
    CollectionsResponse, CountResponse, CreatorWordsResponse, PerTimeQuery, SearchQuery,
    StatisticResponse, UsersResponse,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::{StatisticsService, search_settings_from_query};

#[tracing::instrument(skip_all)]
pub async fn users(
    Extension(svc): Extension<Arc<StatisticsService>>,
    uri: Uri,
) -> ApiResult<Json<UsersResponse>> {
    let users = svc.users().await.map_err(problem_at(&uri))?;
    Ok(Json(UsersResponse {
        users: users.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip_all)]
pub async fn collections(
    Extension(svc): Extension<Arc<StatisticsService>>,
    uri: Uri,
) -> ApiResult<Json<CollectionsResponse>> {
    let collections = svc.collections().await.map_err(problem_at(&uri))?;
    Ok(Json(CollectionsResponse {
        collections: collections.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip_all)]
pub async fn words_count(
    Extension(svc): Extension<Arc<StatisticsService>>,
    uri: Uri,
) -> ApiResult<Json<CountResponse>> {
    let count = svc.words_count().await.map_err(problem_at(&uri))?;
    Ok(Json(CountResponse { count }))
}

#[tracing::instrument(skip_all)]
pub async fn words_per_time(
    Extension(svc): Extension<Arc<StatisticsService>>,
    uri: Uri,
    query: Result<Query<PerTimeQuery>, QueryRejection>,
) -> ApiResult<Json<StatisticResponse>> {
    let query = query_args(query, &uri)?;
    let buckets = svc
        .words_per_time(query.time.as_deref())
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(StatisticResponse {
        statistic: buckets.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip_all)]
pub async fn search_words(
    Extension(svc): Extension<Arc<StatisticsService>>,
    uri: Uri,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<CreatorWordsResponse>> {
    let query = query_args(query, &uri)?;
    let settings = search_settings_from_query(
        query.search_by.as_deref(),
        query.text.as_deref(),
        query.parts_of_speech.as_deref(),
    )
    .map_err(problem_at(&uri))?;

    let hits = svc.search_all(settings).await.map_err(problem_at(&uri))?;
    Ok(Json(CreatorWordsResponse {
        words: hits.into_iter().map(Into::into).collect(),
    }))
}
