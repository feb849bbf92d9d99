use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;

use super::{json_body, problem_at};
use crate::api::rest::auth::CurrentUser;
use crate::api::rest::dto::{
    CreatedUserResponse, LanguageRequest, LoginRequest, RegisterRequest, SettingsResponse,
    TokenResponse, UserResponse,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::UsersService;

#[tracing::instrument(skip_all)]
pub async fn register(
    Extension(svc): Extension<Arc<UsersService>>,
    uri: Uri,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(body, &uri)?;
    let user = svc.register(req.into()).await.map_err(problem_at(&uri))?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            message: "success".to_owned(),
            user: user.into(),
        }),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn login(
    Extension(svc): Extension<Arc<UsersService>>,
    uri: Uri,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let req = json_body(body, &uri)?;
    let token = svc
        .login(&req.email, &req.password)
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(TokenResponse { token }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn me(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<UsersService>>,
    uri: Uri,
) -> ApiResult<Json<UserResponse>> {
    // Re-read so settings changed earlier in this session are current.
    let user = svc.get(user.id).await.map_err(problem_at(&uri))?;
    Ok(Json(UserResponse { user: user.into() }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn update_language(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<UsersService>>,
    uri: Uri,
    body: Result<Json<LanguageRequest>, JsonRejection>,
) -> ApiResult<Json<SettingsResponse>> {
    let req = json_body(body, &uri)?;
    let settings = svc
        .update_language(user.id, &req.language)
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(SettingsResponse {
        message: "success update".to_owned(),
        settings: settings.into(),
    }))
}
