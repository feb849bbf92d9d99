//! Bearer authentication middleware and the authenticated-user extractor.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use vocabulary_sdk::User;

use super::error::{ErrorCode, Problem, domain_error_to_problem};
use crate::domain::service::UsersService;

/// The user resolved from the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("CurrentUser missing - auth middleware not applied to route");
                ErrorCode::Internal
                    .with_message("An internal error occurred")
                    .with_instance(parts.uri.path())
            })
    }
}

/// Resolve `Authorization: Bearer <token>` to a user and store it in the request.
pub async fn require_user(
    State(users): State<Arc<UsersService>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_preflight_request(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_owned();
    let Some(token) = extract_bearer_token(request.headers()).map(ToOwned::to_owned) else {
        return ErrorCode::Unauthorized
            .with_message("Missing bearer token")
            .with_instance(path)
            .into_response();
    };

    match users.authenticate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(e) => domain_error_to_problem(e, &path).into_response(),
    }
}

/// Reject callers without the super-user flag. Must run after [`require_user`].
pub async fn require_super_user(request: Request, next: Next) -> Response {
    let is_super = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|CurrentUser(user)| user.is_super);
    if !is_super {
        return ErrorCode::Unauthorized
            .with_message("Super-user access required")
            .with_instance(request.uri().path())
            .into_response();
    }
    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}
