//! Outbound collaborators used by the domain services.

use std::time::Duration;

use async_trait::async_trait;

/// One-way password digests.
pub trait CredentialHasher: Send + Sync {
    /// # Errors
    /// Fails when the configured work factor is not accepted by the algorithm.
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;

    /// Malformed digests verify as `false`.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// Rejection of a bearer token. The reason is only meant for logs.
#[derive(Debug, thiserror::Error)]
#[error("invalid token: {0}")]
pub struct InvalidToken(pub String);

/// Signed, time-limited identity tokens.
pub trait TokenService: Send + Sync {
    /// # Errors
    /// Fails when the token cannot be encoded.
    fn issue(&self, user_id: i64, ttl: Duration) -> anyhow::Result<String>;

    /// # Errors
    /// Any signature, algorithm, expiry or subject problem yields [`InvalidToken`].
    fn parse(&self, token: &str) -> Result<i64, InvalidToken>;
}

/// External text translation keyed by provider language codes.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;
}

/// Durable blob storage that hands back a public URL.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_public(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<String>;
}

/// One row of an exported collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRow {
    pub word: String,
    pub translation: String,
}

/// Renders a collection's words to a PDF document.
pub trait PdfRenderer: Send + Sync {
    /// # Errors
    /// Fails when the document cannot be produced.
    fn render_word_table(&self, title: &str, rows: &[WordRow]) -> anyhow::Result<Vec<u8>>;
}
