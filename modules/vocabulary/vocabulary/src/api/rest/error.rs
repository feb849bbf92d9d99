//! JSON problem bodies for failed requests.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vocabulary_sdk::VocabularyError;

use crate::domain::error::DomainError;

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Stable, machine-readable error classes exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal_error",
        }
    }

    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Problem carrying this code and its status.
    pub fn with_message(self, message: impl Into<String>) -> Problem {
        Problem {
            message: message.into(),
            code: self.as_str().to_owned(),
            status: self.status().as_u16(),
            instance: String::new(),
            trace_id: None,
        }
    }
}

impl From<&VocabularyError> for ErrorCode {
    fn from(e: &VocabularyError) -> Self {
        match e {
            VocabularyError::Validation { .. } => Self::Validation,
            VocabularyError::Unauthorized => Self::Unauthorized,
            VocabularyError::NotFound { .. } => Self::NotFound,
            VocabularyError::Conflict { .. } => Self::Conflict,
            VocabularyError::Internal => Self::Internal,
        }
    }
}

/// Error body: `{message, code, status, instance, traceId?}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct Problem {
    /// Human-readable description of this occurrence.
    pub message: String,
    /// One of `validation_error`, `unauthorized`, `not_found`, `conflict`, `internal_error`.
    pub code: String,
    pub status: u16,
    /// Request path the problem occurred on.
    pub instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl Problem {
    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

pub type ApiResult<T> = Result<T, Problem>;

/// Map a domain error to a problem body. Store and upstream details are logged, not returned.
pub fn domain_error_to_problem(e: DomainError, instance: &str) -> Problem {
    let trace_id = tracing::Span::current()
        .id()
        .map(|id| id.into_u64().to_string());

    let message = match &e {
        DomainError::Database(_)
        | DomainError::Search(_)
        | DomainError::Upstream(_)
        | DomainError::Internal(_) => {
            tracing::error!(error = ?e, "Request failed");
            "An internal error occurred".to_owned()
        }
        DomainError::Unauthorized(reason) => {
            tracing::debug!(%reason, "Request rejected as unauthorized");
            e.to_string()
        }
        _ => e.to_string(),
    };

    let public = VocabularyError::from(e);
    let mut problem = ErrorCode::from(&public)
        .with_message(message)
        .with_instance(instance);
    if let Some(id) = trace_id {
        problem = problem.with_trace_id(id);
    }
    problem
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(e, "/")
    }
}

impl From<JsonRejection> for Problem {
    fn from(rejection: JsonRejection) -> Self {
        ErrorCode::Validation.with_message(rejection.body_text())
    }
}

impl From<QueryRejection> for Problem {
    fn from(rejection: QueryRejection) -> Self {
        ErrorCode::Validation.with_message(rejection.body_text())
    }
}

impl From<PathRejection> for Problem {
    fn from(rejection: PathRejection) -> Self {
        ErrorCode::Validation.with_message(rejection.body_text())
    }
}
