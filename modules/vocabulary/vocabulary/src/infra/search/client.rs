//! Thin JSON client over the Elasticsearch REST API.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::ElasticConfig;

#[derive(Debug, Error)]
pub enum ElasticError {
    #[error("elasticsearch returned {status}: {kind}: {reason}")]
    Status {
        status: StatusCode,
        kind: String,
        reason: String,
    },
    #[error("elasticsearch request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid elasticsearch path {path}: {source}")]
    Path {
        path: String,
        source: url::ParseError,
    },
}

impl ElasticError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Status { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

pub struct ElasticClient {
    http: Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticClient {
    /// # Errors
    /// Fails when the base URL is invalid or the HTTP client cannot be built.
    pub fn new(cfg: &ElasticConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;
        let base = Url::parse(&cfg.url)?;
        Ok(Self {
            http,
            base,
            username: cfg.username.clone(),
            password: cfg.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ElasticError> {
        let url = self.base.join(path).map_err(|source| ElasticError::Path {
            path: path.to_owned(),
            source,
        })?;
        let builder = self.http.request(method, url);
        Ok(match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        })
    }

    /// `HEAD` request: `true` on 200, `false` on 404.
    pub async fn exists(&self, path: &str) -> Result<bool, ElasticError> {
        let response = self.request(Method::HEAD, path)?.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(ElasticError::Status {
                status,
                kind: "unexpected_status".to_owned(),
                reason: format!("HEAD {path}"),
            }),
        }
    }

    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ElasticError> {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Self::decode(builder.send().await?).await
    }

    /// Newline-delimited request body, as used by `_bulk`.
    pub async fn send_ndjson(&self, path: &str, body: String) -> Result<Value, ElasticError> {
        let response = self
            .request(Method::POST, path)?
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, ElasticError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }

        let error = &body["error"];
        let kind = error["type"]
            .as_str()
            .or_else(|| body["result"].as_str())
            .unwrap_or("unknown")
            .to_owned();
        let reason = error["reason"]
            .as_str()
            .map_or_else(|| String::from_utf8_lossy(&bytes).into_owned(), ToOwned::to_owned);
        Err(ElasticError::Status {
            status,
            kind,
            reason,
        })
    }
}
