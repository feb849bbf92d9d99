//! HTTP handlers, one submodule per resource.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::http::Uri;
use axum::Json;
use utoipa::openapi::OpenApi;

use super::dto::HealthResponse;
use super::error::{ApiResult, Problem, domain_error_to_problem};
use crate::domain::error::DomainError;

pub mod collections;
pub mod statistics;
pub mod users;
pub mod words;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn openapi_document(Extension(doc): Extension<Arc<OpenApi>>) -> Json<OpenApi> {
    Json((*doc).clone())
}

/// Error mapper that tags the problem with the request path.
fn problem_at(uri: &Uri) -> impl FnOnce(DomainError) -> Problem + '_ {
    move |e| domain_error_to_problem(e, uri.path())
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>, uri: &Uri) -> ApiResult<T> {
    body.map(|Json(v)| v)
        .map_err(|r| Problem::from(r).with_instance(uri.path()))
}

fn path_args<T>(path: Result<Path<T>, PathRejection>, uri: &Uri) -> ApiResult<T> {
    path.map(|Path(v)| v)
        .map_err(|r| Problem::from(r).with_instance(uri.path()))
}

fn query_args<T>(query: Result<Query<T>, QueryRejection>, uri: &Uri) -> ApiResult<T> {
    query
        .map(|Query(v)| v)
        .map_err(|r| Problem::from(r).with_instance(uri.path()))
}
