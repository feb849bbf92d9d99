//! Route registration with an attached OpenAPI description.
//!
//! Every route goes through [`OperationBuilder`], which records the operation
//! in an [`ApiCatalog`] while wiring the handler into the router. The catalog
//! later renders a single `OpenApi` document served at `/openapi.json`.

use std::collections::BTreeMap;

use axum::Router;
use axum::handler::Handler;
use axum::routing::MethodRouter;
use http::{Method, StatusCode};
use utoipa::openapi::{
    OpenApi, OpenApiBuilder, Ref, RefOr, Required,
    content::ContentBuilder,
    info::InfoBuilder,
    path::{HttpMethod, OperationBuilder as UOperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathsBuilder},
    request_body::RequestBodyBuilder,
    response::{ResponseBuilder, ResponsesBuilder},
    schema::{ComponentsBuilder, ObjectBuilder, Schema, SchemaFormat, SchemaType, Type},
    security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme},
};
use utoipa::{PartialSchema, ToSchema};

use super::error::{APPLICATION_PROBLEM_JSON, Problem};

const BEARER_AUTH: &str = "bearerAuth";

/// Who may call an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    User,
    SuperUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// `integer` or `string`.
    pub param_type: &'static str,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResponseSpec {
    pub status: u16,
    pub content_type: &'static str,
    pub description: String,
    /// Component name for JSON bodies; `None` for binary content.
    pub schema_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub access: Access,
    pub params: Vec<ParamSpec>,
    pub request_schema: Option<String>,
    pub responses: Vec<ResponseSpec>,
}

/// Registered operations and the schema components they reference.
#[derive(Default)]
pub struct ApiCatalog {
    operations: Vec<OperationSpec>,
    components: BTreeMap<String, RefOr<Schema>>,
}

impl ApiCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` and every schema it references; returns its component name.
    pub fn ensure_schema<T: ToSchema + PartialSchema + 'static>(&mut self) -> String {
        let root = T::name().to_string();
        let mut collected = vec![(root.clone(), <T as PartialSchema>::schema())];
        T::schemas(&mut collected);
        for (name, schema) in collected {
            self.components.entry(name).or_insert(schema);
        }
        root
    }

    pub fn register_operation(&mut self, spec: OperationSpec) {
        tracing::debug!(
            method = %spec.method,
            path = %spec.path,
            operation_id = spec.operation_id.as_deref().unwrap_or("-"),
            "Registered API operation"
        );
        self.operations.push(spec);
    }

    #[must_use]
    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }

    #[must_use]
    pub fn build_openapi(&self, title: &str, version: &str) -> OpenApi {
        tracing::info!(operations = self.operations.len(), "Building OpenAPI document");

        let mut paths = PathsBuilder::new();
        for spec in &self.operations {
            let item = PathItemBuilder::new()
                .operation(http_method(&spec.method), build_operation(spec))
                .build();
            paths = paths.path(spec.path.clone(), item);
        }

        let mut components = ComponentsBuilder::new();
        for (name, schema) in &self.components {
            components = components.schema(name.clone(), schema.clone());
        }
        components = components.security_scheme(
            BEARER_AUTH,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

        OpenApiBuilder::new()
            .info(InfoBuilder::new().title(title).version(version).build())
            .paths(paths.build())
            .components(Some(components.build()))
            .build()
    }
}

fn http_method(method: &Method) -> HttpMethod {
    match *method {
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::DELETE => HttpMethod::Delete,
        Method::PATCH => HttpMethod::Patch,
        _ => HttpMethod::Get,
    }
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn build_operation(spec: &OperationSpec) -> utoipa::openapi::path::Operation {
    let mut op = UOperationBuilder::new()
        .operation_id(spec.operation_id.clone())
        .summary(spec.summary.clone());
    for tag in &spec.tags {
        op = op.tag(tag.clone());
    }

    for p in &spec.params {
        let (location, required) = match p.location {
            ParamLocation::Path => (ParameterIn::Path, Required::True),
            ParamLocation::Query if p.required => (ParameterIn::Query, Required::True),
            ParamLocation::Query => (ParameterIn::Query, Required::False),
        };
        let ty = if p.param_type == "integer" {
            Type::Integer
        } else {
            Type::String
        };
        let schema = Schema::Object(ObjectBuilder::new().schema_type(SchemaType::Type(ty)).build());
        op = op.parameter(
            ParameterBuilder::new()
                .name(&p.name)
                .parameter_in(location)
                .required(required)
                .description(p.description.clone())
                .schema(Some(schema))
                .build(),
        );
    }

    if let Some(name) = &spec.request_schema {
        let content = ContentBuilder::new().schema(Some(schema_ref(name))).build();
        op = op.request_body(Some(
            RequestBodyBuilder::new()
                .content("application/json", content)
                .required(Some(Required::True))
                .build(),
        ));
    }

    let mut responses = ResponsesBuilder::new();
    for r in &spec.responses {
        let schema = match &r.schema_name {
            Some(name) => schema_ref(name),
            None => RefOr::T(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(SchemaType::Type(Type::String))
                    .format(Some(SchemaFormat::Custom("binary".into())))
                    .build(),
            )),
        };
        let content = ContentBuilder::new().schema(Some(schema)).build();
        responses = responses.response(
            r.status.to_string(),
            ResponseBuilder::new()
                .description(&r.description)
                .content(r.content_type, content)
                .build(),
        );
    }
    op = op.responses(responses.build());

    if spec.access != Access::Public {
        op = op.security(SecurityRequirement::new(BEARER_AUTH, Vec::<String>::new()));
    }
    op.build()
}

/// Fluent description of one route.
///
/// ```rust,ignore
/// router = OperationBuilder::get("/collection/{id}")
///     .operation_id("collections.get")
///     .require_auth()
///     .path_param("id", "Collection id")
///     .handler(handlers::collections::get_collection)
///     .json_response::<CollectionResponse>(catalog, StatusCode::OK, "Collection")
///     .error_404(catalog)
///     .register(router, catalog);
/// ```
pub struct OperationBuilder<H: HandlerSlot = Missing> {
    spec: OperationSpec,
    method_router: H::Slot,
}

/// Whether a builder carries its handler yet.
pub mod state {
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;

    #[derive(Debug, Clone, Copy)]
    pub struct Present;
}

use state::{Missing, Present};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Missing {}
    impl Sealed for super::Present {}
}

/// Maps a builder state to the storage for its handler.
pub trait HandlerSlot: sealed::Sealed {
    type Slot;
}

impl HandlerSlot for Missing {
    type Slot = ();
}

impl HandlerSlot for Present {
    type Slot = MethodRouter;
}

impl OperationBuilder<Missing> {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            spec: OperationSpec {
                method,
                path: path.into(),
                operation_id: None,
                summary: None,
                tags: Vec::new(),
                access: Access::Public,
                params: Vec::new(),
                request_schema: None,
                responses: Vec::new(),
            },
            method_router: (),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach the axum handler; only a builder with a handler can be registered.
    #[must_use]
    pub fn handler<F, T>(self, handler: F) -> OperationBuilder<Present>
    where
        F: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let method_router = match self.spec.method {
            Method::POST => axum::routing::post(handler),
            Method::PUT => axum::routing::put(handler),
            Method::DELETE => axum::routing::delete(handler),
            _ => axum::routing::get(handler),
        };
        OperationBuilder {
            spec: self.spec,
            method_router,
        }
    }
}

impl<H: HandlerSlot> OperationBuilder<H> {
    #[must_use]
    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    #[must_use]
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.spec.operation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.spec.summary = Some(text.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.spec.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn require_auth(mut self) -> Self {
        self.spec.access = Access::User;
        self
    }

    #[must_use]
    pub fn require_super_user(mut self) -> Self {
        self.spec.access = Access::SuperUser;
        self
    }

    #[must_use]
    pub fn path_param(mut self, name: &str, description: &str) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.to_owned(),
            location: ParamLocation::Path,
            required: true,
            param_type: "integer",
            description: Some(description.to_owned()),
        });
        self
    }

    /// Path parameter holding an opaque string id.
    #[must_use]
    pub fn path_param_str(mut self, name: &str, description: &str) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.to_owned(),
            location: ParamLocation::Path,
            required: true,
            param_type: "string",
            description: Some(description.to_owned()),
        });
        self
    }

    #[must_use]
    pub fn query_param(
        mut self,
        name: &str,
        param_type: &'static str,
        required: bool,
        description: &str,
    ) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.to_owned(),
            location: ParamLocation::Query,
            required,
            param_type,
            description: Some(description.to_owned()),
        });
        self
    }

    #[must_use]
    pub fn json_request<T: ToSchema + PartialSchema + 'static>(
        mut self,
        catalog: &mut ApiCatalog,
    ) -> Self {
        self.spec.request_schema = Some(catalog.ensure_schema::<T>());
        self
    }

    #[must_use]
    pub fn json_response<T: ToSchema + PartialSchema + 'static>(
        mut self,
        catalog: &mut ApiCatalog,
        status: StatusCode,
        description: &str,
    ) -> Self {
        let name = catalog.ensure_schema::<T>();
        self.spec.responses.push(ResponseSpec {
            status: status.as_u16(),
            content_type: "application/json",
            description: description.to_owned(),
            schema_name: Some(name),
        });
        self
    }

    /// Binary response body of the given media type.
    #[must_use]
    pub fn binary_response(
        mut self,
        status: StatusCode,
        content_type: &'static str,
        description: &str,
    ) -> Self {
        self.spec.responses.push(ResponseSpec {
            status: status.as_u16(),
            content_type,
            description: description.to_owned(),
            schema_name: None,
        });
        self
    }

    #[must_use]
    pub fn problem_response(
        mut self,
        catalog: &mut ApiCatalog,
        status: StatusCode,
        description: &str,
    ) -> Self {
        let name = catalog.ensure_schema::<Problem>();
        self.spec.responses.push(ResponseSpec {
            status: status.as_u16(),
            content_type: APPLICATION_PROBLEM_JSON,
            description: description.to_owned(),
            schema_name: Some(name),
        });
        self
    }

    #[must_use]
    pub fn error_400(self, catalog: &mut ApiCatalog) -> Self {
        self.problem_response(catalog, StatusCode::BAD_REQUEST, "Bad Request")
    }

    #[must_use]
    pub fn error_401(self, catalog: &mut ApiCatalog) -> Self {
        self.problem_response(catalog, StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    #[must_use]
    pub fn error_404(self, catalog: &mut ApiCatalog) -> Self {
        self.problem_response(catalog, StatusCode::NOT_FOUND, "Not Found")
    }

    #[must_use]
    pub fn error_409(self, catalog: &mut ApiCatalog) -> Self {
        self.problem_response(catalog, StatusCode::CONFLICT, "Conflict")
    }

    #[must_use]
    pub fn error_500(self, catalog: &mut ApiCatalog) -> Self {
        self.problem_response(catalog, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

}

impl OperationBuilder<Present> {
    /// Record the operation and mount its handler.
    pub fn register(self, router: Router, catalog: &mut ApiCatalog) -> Router {
        let path = self.spec.path.clone();
        catalog.register_operation(self.spec);
        router.route(&path, self.method_router)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::Json;

    async fn ok() -> Json<serde_json::Value> {
        Json(serde_json::json!({ "status": "ok" }))
    }

    #[test]
    fn builder_records_spec_fields() {
        let builder = OperationBuilder::get("/collection/{id}")
            .operation_id("collections.get")
            .summary("Get a collection")
            .tag("collection")
            .require_auth()
            .path_param("id", "Collection id");

        let spec = builder.spec();
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.access, Access::User);
        assert_eq!(spec.params.len(), 1);
        assert_eq!(spec.params[0].location, ParamLocation::Path);
    }

    #[test]
    fn handler_keeps_fields_recorded_before_it() {
        let builder = OperationBuilder::put("/collection/{id}")
            .operation_id("collections.update")
            .require_auth()
            .path_param("id", "Collection id")
            .handler(ok);

        let spec = builder.spec();
        assert_eq!(spec.method, Method::PUT);
        assert_eq!(spec.operation_id.as_deref(), Some("collections.update"));
        assert_eq!(spec.params.len(), 1);
    }

    #[test]
    fn register_adds_operation_and_problem_schema() {
        let mut catalog = ApiCatalog::new();
        let _router = OperationBuilder::get("/health")
            .operation_id("health")
            .handler(ok)
            .error_500(&mut catalog)
            .register(Router::new(), &mut catalog);

        assert_eq!(catalog.operations().len(), 1);
        let doc = serde_json::to_value(catalog.build_openapi("Vocabulary", "0.1.0")).unwrap();
        assert!(doc["components"]["schemas"]["Problem"].is_object());
        assert!(doc["paths"]["/health"]["get"].is_object());
        assert!(doc["paths"]["/health"]["get"]["security"].is_null());
    }

    #[test]
    fn secured_operations_reference_bearer_scheme() {
        let mut catalog = ApiCatalog::new();
        let router = OperationBuilder::get("/user/me")
            .require_auth()
            .handler(ok)
            .register(Router::new(), &mut catalog);
        let _router = OperationBuilder::delete("/user/me")
            .require_auth()
            .handler(ok)
            .register(router, &mut catalog);

        let doc = serde_json::to_value(catalog.build_openapi("Vocabulary", "0.1.0")).unwrap();
        assert!(doc["paths"]["/user/me"]["get"]["security"].is_array());
        assert!(doc["paths"]["/user/me"]["delete"].is_object());
        assert_eq!(
            doc["components"]["securitySchemes"]["bearerAuth"]["scheme"],
            "bearer"
        );
    }
}
