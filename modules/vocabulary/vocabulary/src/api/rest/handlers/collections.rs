use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use vocabulary_sdk::CollectionPatch;

use super::{json_body, path_args, problem_at, query_args};
use crate::api::rest::auth::CurrentUser;
use crate::api::rest::dto::{
    CollectionMessageResponse, CollectionResponse, CollectionsResponse, CreateCollectionRequest,
    MessageResponse, SearchQuery, UpdateCollectionRequest, WordsResponse,
};
use crate::api::rest::error::ApiResult;
use crate::domain::service::{CollectionsService, search_settings_from_query};

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn create_collection(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
    body: Result<Json<CreateCollectionRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(body, &uri)?;
    let collection = svc
        .create(user.id, req.into())
        .await
        .map_err(problem_at(&uri))?;
    Ok((
        StatusCode::CREATED,
        Json(CollectionMessageResponse {
            message: "success".to_owned(),
            collection: collection.into(),
        }),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn list_collections(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
) -> ApiResult<Json<CollectionsResponse>> {
    let collections = svc.list_for_owner(user.id).await.map_err(problem_at(&uri))?;
    Ok(Json(CollectionsResponse {
        collections: collections.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn get_collection(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<CollectionResponse>> {
    let id = path_args(path, &uri)?;
    let collection = svc.get(user.id, id).await.map_err(problem_at(&uri))?;
    Ok(Json(CollectionResponse {
        collection: collection.into(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn update_collection(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateCollectionRequest>, JsonRejection>,
) -> ApiResult<Json<CollectionMessageResponse>> {
    let id = path_args(path, &uri)?;
    let req = json_body(body, &uri)?;
    let collection = svc
        .update(user.id, id, CollectionPatch { name: req.name })
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(CollectionMessageResponse {
        message: "success update".to_owned(),
        collection: collection.into(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn delete_collection(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = path_args(path, &uri)?;
    svc.delete(user.id, id).await.map_err(problem_at(&uri))?;
    Ok(Json(MessageResponse::new("success delete")))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn search_collection(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<WordsResponse>> {
    let id = path_args(path, &uri)?;
    let query = query_args(query, &uri)?;
    let settings = search_settings_from_query(
        query.search_by.as_deref(),
        query.text.as_deref(),
        query.parts_of_speech.as_deref(),
    )
    .map_err(problem_at(&uri))?;

    let words = svc
        .search(user.id, id, settings)
        .await
        .map_err(problem_at(&uri))?;
    Ok(Json(WordsResponse {
        words: words.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn generate_pdf(
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<Arc<CollectionsService>>,
    uri: Uri,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Response> {
    let id = path_args(path, &uri)?;
    let export = svc.export_pdf(user.id, id).await.map_err(problem_at(&uri))?;

    let mut response = export.content.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&export.file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// `attachment` disposition with an ASCII-safe quoted file name.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::super::test_util::send;
    use super::*;
    use crate::domain::service::test_support::TestEnv;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::json;
    use tower::ServiceExt as _;
    use vocabulary_sdk::{NewUser, NewWord, User};

    fn router(env: &TestEnv, user: User) -> Router {
        Router::new()
            .route("/collection", post(create_collection))
            .route("/collection/all", get(list_collections))
            .route(
                "/collection/{id}",
                get(get_collection)
                    .put(update_collection)
                    .delete(delete_collection),
            )
            .route("/collection/{id}/search", get(search_collection))
            .route("/collection/{id}/generatePdf", post(generate_pdf))
            .layer(Extension(env.services().collections))
            .layer(Extension(CurrentUser(user)))
    }

    async fn registered(env: &TestEnv) -> User {
        env.services()
            .users
            .register(NewUser {
                name: "Ana".to_owned(),
                email: "ana@example.com".to_owned(),
                password: "secret-pass".to_owned(),
            })
            .await
            .unwrap()
    }

    async fn create_spanish(router: Router) -> i64 {
        let (status, body) = send(
            router,
            "POST",
            "/collection",
            Some(json!({"name": "Spanish", "langFrom": "es", "langTo": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["collection"]["id"].as_i64().unwrap()
    }

    async fn add_word(env: &TestEnv, user: &User, collection_id: i64, word: &str, translation: &str) {
        env.services()
            .words
            .create(
                user.id,
                NewWord {
                    collection_id,
                    word: word.to_owned(),
                    translation: translation.to_owned(),
                    part_of_speech: "noun".to_owned(),
                    sentence: String::new(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_then_read_collection() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let id = create_spanish(router(&env, user.clone())).await;
        assert!(env.index.has_alias(user.id, id));

        let (status, body) = send(router(&env, user), "GET", &format!("/collection/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collection"]["name"], "Spanish");
        assert_eq!(body["collection"]["langFrom"], "es");
        assert_eq!(body["collection"]["words"], json!([]));
    }

    #[tokio::test]
    async fn same_languages_are_rejected() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let (status, body) = send(
            router(&env, user),
            "POST",
            "/collection",
            Some(json!({"name": "Echo", "langFrom": "en", "langTo": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn listing_includes_words() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let id = create_spanish(router(&env, user.clone())).await;
        add_word(&env, &user, id, "gato", "cat").await;

        let (status, body) = send(router(&env, user), "GET", "/collection/all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collections"][0]["words"][0]["word"], "gato");
    }

    #[tokio::test]
    async fn rename_and_delete() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let id = create_spanish(router(&env, user.clone())).await;

        let (status, body) = send(
            router(&env, user.clone()),
            "PUT",
            &format!("/collection/{id}"),
            Some(json!({"name": "Castellano"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collection"]["name"], "Castellano");

        let (status, body) =
            send(router(&env, user.clone()), "DELETE", &format!("/collection/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "success delete");

        let (status, _) = send(router(&env, user), "GET", &format!("/collection/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_numeric_id_is_bad_request() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let (status, body) = send(router(&env, user), "GET", "/collection/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["instance"], "/collection/abc");
    }

    #[tokio::test]
    async fn search_matches_substring_and_empty_text_matches_nothing() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let id = create_spanish(router(&env, user.clone())).await;
        add_word(&env, &user, id, "gato", "cat").await;
        add_word(&env, &user, id, "perro", "dog").await;

        let (status, body) = send(
            router(&env, user.clone()),
            "GET",
            &format!("/collection/{id}/search?searchBy=word&text=gat"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let words = body["words"].as_array().unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0]["word"], "gato");

        let (status, body) = send(
            router(&env, user.clone()),
            "GET",
            &format!("/collection/{id}/search?searchBy=word&text="),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["words"], json!([]));

        let (status, _) = send(
            router(&env, user),
            "GET",
            &format!("/collection/{id}/search?searchBy=colour&text=gat"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pdf_export_is_an_attachment() {
        let env = TestEnv::new();
        let user = registered(&env).await;
        let id = create_spanish(router(&env, user.clone())).await;
        add_word(&env, &user, id, "gato", "cat").await;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/collection/{id}/generatePdf"))
            .body(Body::empty())
            .unwrap();
        let response = router(&env, user).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Spanish.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(env.pdf.last_rows(), vec![("gato".to_owned(), "cat".to_owned())]);
    }

    #[test]
    fn disposition_replaces_unsafe_characters() {
        assert_eq!(
            content_disposition("My \"best\" words.pdf"),
            "attachment; filename=\"My _best_ words.pdf\""
        );
        assert_eq!(
            content_disposition("caf\u{e9}.pdf"),
            "attachment; filename=\"caf_.pdf\""
        );
    }
}
