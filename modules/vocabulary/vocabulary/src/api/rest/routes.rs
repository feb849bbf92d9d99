//! Route table of the vocabulary REST API.
//!
//! Routes are grouped by access level. Each group gets its own auth layers
//! before the groups are merged into one router.

use std::sync::Arc;

use axum::http::{StatusCode, Uri};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Extension, Router};

use super::auth::{require_super_user, require_user};
use super::dto;
use super::error::{ErrorCode, Problem};
use super::handlers;
use super::openapi::{ApiCatalog, OperationBuilder};
use crate::domain::service::AppServices;

const API_TITLE: &str = "Vocabulary API";

/// Build the complete API router, including `/health` and `/openapi.json`.
pub fn build_router(services: &AppServices) -> Router {
    let mut catalog = ApiCatalog::new();

    let public = register_public_routes(Router::new(), &mut catalog);
    let user = register_user_routes(Router::new(), &mut catalog)
        .route_layer(from_fn_with_state(services.users.clone(), require_user));
    let admin = register_statistic_routes(Router::new(), &mut catalog)
        .route_layer(from_fn(require_super_user))
        .route_layer(from_fn_with_state(services.users.clone(), require_user));

    let openapi = Arc::new(catalog.build_openapi(API_TITLE, env!("CARGO_PKG_VERSION")));

    public
        .merge(user)
        .merge(admin)
        .route("/openapi.json", axum::routing::get(handlers::openapi_document))
        .fallback(not_found)
        .layer(Extension(openapi))
        .layer(Extension(services.users.clone()))
        .layer(Extension(services.collections.clone()))
        .layer(Extension(services.words.clone()))
        .layer(Extension(services.statistics.clone()))
}

async fn not_found(uri: Uri) -> Problem {
    ErrorCode::NotFound
        .with_message(format!("No route for {}", uri.path()))
        .with_instance(uri.path())
}

fn register_public_routes(mut router: Router, api: &mut ApiCatalog) -> Router {
    router = OperationBuilder::get("/health")
        .operation_id("health")
        .summary("Liveness check")
        .tag("system")
        .handler(handlers::health)
        .json_response::<dto::HealthResponse>(api, StatusCode::OK, "Service is up")
        .register(router, api);

    for (path, id) in [("/user", "users.create"), ("/user/registration", "users.register")] {
        router = OperationBuilder::post(path)
            .operation_id(id)
            .summary("Register a user")
            .tag("user")
            .json_request::<dto::RegisterRequest>(api)
            .handler(handlers::users::register)
            .json_response::<dto::CreatedUserResponse>(api, StatusCode::CREATED, "User created")
            .error_400(api)
            .error_409(api)
            .error_500(api)
            .register(router, api);
    }

    router = OperationBuilder::post("/user/login")
        .operation_id("users.login")
        .summary("Exchange credentials for a bearer token")
        .tag("user")
        .json_request::<dto::LoginRequest>(api)
        .handler(handlers::users::login)
        .json_response::<dto::TokenResponse>(api, StatusCode::OK, "Token issued")
        .error_400(api)
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router
}

fn register_user_routes(router: Router, api: &mut ApiCatalog) -> Router {
    let router = register_account_routes(router, api);
    let router = register_collection_routes(router, api);
    register_word_routes(router, api)
}

fn register_account_routes(mut router: Router, api: &mut ApiCatalog) -> Router {
    router = OperationBuilder::get("/user/me")
        .operation_id("users.me")
        .summary("Current user with settings")
        .tag("user")
        .require_auth()
        .handler(handlers::users::me)
        .json_response::<dto::UserResponse>(api, StatusCode::OK, "Current user")
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::put("/user/settings/language")
        .operation_id("users.update_language")
        .summary("Change the preferred language")
        .tag("user")
        .require_auth()
        .json_request::<dto::LanguageRequest>(api)
        .handler(handlers::users::update_language)
        .json_response::<dto::SettingsResponse>(api, StatusCode::OK, "Settings updated")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router
}

fn register_collection_routes(mut router: Router, api: &mut ApiCatalog) -> Router {
    router = OperationBuilder::post("/collection")
        .operation_id("collections.create")
        .summary("Create a collection")
        .tag("collection")
        .require_auth()
        .json_request::<dto::CreateCollectionRequest>(api)
        .handler(handlers::collections::create_collection)
        .json_response::<dto::CollectionMessageResponse>(api, StatusCode::CREATED, "Collection created")
        .error_400(api)
        .error_401(api)
        .error_409(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/collection/all")
        .operation_id("collections.list")
        .summary("Caller's collections with their words")
        .tag("collection")
        .require_auth()
        .handler(handlers::collections::list_collections)
        .json_response::<dto::CollectionsResponse>(api, StatusCode::OK, "Collections")
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/collection/{id}")
        .operation_id("collections.get")
        .summary("Get a collection")
        .tag("collection")
        .require_auth()
        .path_param("id", "Collection id")
        .handler(handlers::collections::get_collection)
        .json_response::<dto::CollectionResponse>(api, StatusCode::OK, "Collection")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::put("/collection/{id}")
        .operation_id("collections.update")
        .summary("Rename a collection")
        .tag("collection")
        .require_auth()
        .path_param("id", "Collection id")
        .json_request::<dto::UpdateCollectionRequest>(api)
        .handler(handlers::collections::update_collection)
        .json_response::<dto::CollectionMessageResponse>(api, StatusCode::OK, "Collection updated")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_409(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::delete("/collection/{id}")
        .operation_id("collections.delete")
        .summary("Delete a collection")
        .tag("collection")
        .require_auth()
        .path_param("id", "Collection id")
        .handler(handlers::collections::delete_collection)
        .json_response::<dto::MessageResponse>(api, StatusCode::OK, "Collection deleted")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/collection/{id}/search")
        .operation_id("collections.search")
        .summary("Search words of a collection")
        .tag("collection")
        .require_auth()
        .path_param("id", "Collection id")
        .query_param("searchBy", "string", true, "word, translation or sentence")
        .query_param("text", "string", false, "Substring to look for; empty matches nothing")
        .query_param("partsOfSpeech", "string", false, "Comma-separated part-of-speech tags")
        .handler(handlers::collections::search_collection)
        .json_response::<dto::WordsResponse>(api, StatusCode::OK, "Matching words")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::post("/collection/{id}/generatePdf")
        .operation_id("collections.generate_pdf")
        .summary("Export a collection as PDF")
        .tag("collection")
        .require_auth()
        .path_param("id", "Collection id")
        .handler(handlers::collections::generate_pdf)
        .binary_response(StatusCode::OK, "application/pdf", "Rendered document")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router
}

fn register_word_routes(mut router: Router, api: &mut ApiCatalog) -> Router {
    router = OperationBuilder::post("/word")
        .operation_id("words.create")
        .summary("Add a word to a collection")
        .tag("word")
        .require_auth()
        .json_request::<dto::CreateWordRequest>(api)
        .handler(handlers::words::create_word)
        .json_response::<dto::WordMessageResponse>(api, StatusCode::CREATED, "Word created")
        .error_400(api)
        .error_401(api)
        .error_409(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::post("/word/bulk")
        .operation_id("words.bulk_create")
        .summary("Add several words at once")
        .tag("word")
        .require_auth()
        .json_request::<dto::BulkWordsRequest>(api)
        .handler(handlers::words::create_words)
        .json_response::<dto::WordsMessageResponse>(api, StatusCode::CREATED, "Words created")
        .error_400(api)
        .error_401(api)
        .error_409(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::post("/word/translate")
        .operation_id("words.translate")
        .summary("Translate a single word")
        .tag("word")
        .require_auth()
        .query_param("langFrom", "string", true, "Source language code")
        .query_param("langTo", "string", true, "Target language code")
        .json_request::<dto::TranslateRequest>(api)
        .handler(handlers::words::translate_word)
        .json_response::<dto::TranslateRequest>(api, StatusCode::OK, "Translated word")
        .error_400(api)
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/word/collection/{collection_id}")
        .operation_id("words.list")
        .summary("List words of a collection")
        .tag("word")
        .require_auth()
        .path_param("collection_id", "Collection id")
        .query_param("size", "integer", false, "Page size; 0 with page 0 lists without paging")
        .query_param("page", "integer", false, "1-based page number")
        .handler(handlers::words::list_words)
        .json_response::<dto::WordsPageResponse>(api, StatusCode::OK, "Words page")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/word/{id}/collection/{collection_id}")
        .operation_id("words.get")
        .summary("Get a word")
        .tag("word")
        .require_auth()
        .path_param_str("id", "Word id")
        .path_param("collection_id", "Collection id")
        .handler(handlers::words::get_word)
        .json_response::<dto::WordResponse>(api, StatusCode::OK, "Word")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::put("/word/{id}/collection/{collection_id}")
        .operation_id("words.update")
        .summary("Update a word")
        .tag("word")
        .require_auth()
        .path_param_str("id", "Word id")
        .path_param("collection_id", "Collection id")
        .json_request::<dto::UpdateWordRequest>(api)
        .handler(handlers::words::update_word)
        .json_response::<dto::WordMessageResponse>(api, StatusCode::OK, "Word updated")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_409(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::delete("/word/{id}/collection/{collection_id}")
        .operation_id("words.delete")
        .summary("Delete a word")
        .tag("word")
        .require_auth()
        .path_param_str("id", "Word id")
        .path_param("collection_id", "Collection id")
        .handler(handlers::words::delete_word)
        .json_response::<dto::MessageResponse>(api, StatusCode::OK, "Word deleted")
        .error_400(api)
        .error_401(api)
        .error_404(api)
        .error_500(api)
        .register(router, api);

    router
}

fn register_statistic_routes(mut router: Router, api: &mut ApiCatalog) -> Router {
    router = OperationBuilder::get("/statistic/users")
        .operation_id("statistics.users")
        .summary("All users")
        .tag("statistic")
        .require_super_user()
        .handler(handlers::statistics::users)
        .json_response::<dto::UsersResponse>(api, StatusCode::OK, "Users")
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/statistic/collections")
        .operation_id("statistics.collections")
        .summary("All collections")
        .tag("statistic")
        .require_super_user()
        .handler(handlers::statistics::collections)
        .json_response::<dto::CollectionsResponse>(api, StatusCode::OK, "Collections")
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/statistic/words/count")
        .operation_id("statistics.words_count")
        .summary("Number of words across all users")
        .tag("statistic")
        .require_super_user()
        .handler(handlers::statistics::words_count)
        .json_response::<dto::CountResponse>(api, StatusCode::OK, "Word count")
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/statistic/words/perTime")
        .operation_id("statistics.words_per_time")
        .summary("Word creation counts per calendar interval")
        .tag("statistic")
        .require_super_user()
        .query_param("time", "string", true, "minute, hour, day, week, month, quarter or year")
        .handler(handlers::statistics::words_per_time)
        .json_response::<dto::StatisticResponse>(api, StatusCode::OK, "Buckets")
        .error_400(api)
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router = OperationBuilder::get("/statistic/words/search")
        .operation_id("statistics.words_search")
        .summary("Search words of every user")
        .tag("statistic")
        .require_super_user()
        .query_param("searchBy", "string", true, "word, translation or sentence")
        .query_param("text", "string", false, "Substring to look for; empty matches nothing")
        .query_param("partsOfSpeech", "string", false, "Comma-separated part-of-speech tags")
        .handler(handlers::statistics::search_words)
        .json_response::<dto::CreatorWordsResponse>(api, StatusCode::OK, "Matching words with creators")
        .error_400(api)
        .error_401(api)
        .error_500(api)
        .register(router, api);

    router
}
