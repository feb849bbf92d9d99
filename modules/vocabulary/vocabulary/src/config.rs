use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vocabulary_sdk::PageRequest;

use crate::domain::service::ServiceConfig;

/// Configuration of the vocabulary module (`modules.vocabulary` section).
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VocabularyConfig {
    pub elastic: ElasticConfig,
    pub auth: AuthConfig,
    pub aws: AwsConfig,
    /// Reject access to collections owned by another user.
    pub enforce_collection_ownership: bool,
    /// Remove a collection's words and alias when the collection is deleted.
    pub cascade_collection_delete: bool,
    /// Upper bound on words returned by an unpaged listing.
    pub words_unpaged_cap: Option<u64>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElasticConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_owned(),
            username: None,
            password: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens.
    pub secret: String,
    pub token_ttl_secs: u64,
    /// bcrypt work factor.
    pub hash_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: 24 * 60 * 60,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsConfig {
    /// When disabled, translation fails and PDF uploads are skipped.
    pub enabled: bool,
    pub region: Option<String>,
    /// Static credentials; the default provider chain is used when unset.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            bucket: "collections-words".to_owned(),
        }
    }
}

impl VocabularyConfig {
    /// Reject settings the module cannot start with.
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.secret.trim().is_empty() {
            anyhow::bail!("modules.vocabulary.auth.secret must not be empty");
        }
        if !(4..=31).contains(&self.auth.hash_cost) {
            anyhow::bail!(
                "modules.vocabulary.auth.hash_cost must be within 4..=31, got {}",
                self.auth.hash_cost
            );
        }
        if self.auth.token_ttl_secs == 0 {
            anyhow::bail!("modules.vocabulary.auth.token_ttl_secs must be greater than zero");
        }
        if let Some(cap) = self.words_unpaged_cap
            && !(1..=PageRequest::MAX_WINDOW).contains(&cap)
        {
            anyhow::bail!(
                "modules.vocabulary.words_unpaged_cap must be within 1..={}, got {cap}",
                PageRequest::MAX_WINDOW
            );
        }
        url::Url::parse(&self.elastic.url).map_err(|e| {
            anyhow::anyhow!("modules.vocabulary.elastic.url is invalid: {e}")
        })?;
        Ok(())
    }

    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            enforce_collection_ownership: self.enforce_collection_ownership,
            cascade_collection_delete: self.cascade_collection_delete,
            words_unpaged_cap: self.words_unpaged_cap.unwrap_or(defaults.words_unpaged_cap),
            token_ttl: Duration::from_secs(self.auth.token_ttl_secs),
            ..defaults
        }
    }
}

fn redact(value: Option<&String>) -> &'static str {
    if value.is_some_and(|v| !v.is_empty()) {
        "[REDACTED]"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for VocabularyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VocabularyConfig")
            .field("elastic_url", &self.elastic.url)
            .field("elastic_username", &self.elastic.username)
            .field("elastic_password", &redact(self.elastic.password.as_ref()))
            .field("auth_secret", &redact(Some(&self.auth.secret)))
            .field("token_ttl_secs", &self.auth.token_ttl_secs)
            .field("hash_cost", &self.auth.hash_cost)
            .field("aws_enabled", &self.aws.enabled)
            .field("aws_region", &self.aws.region)
            .field("aws_secret", &redact(self.aws.secret_access_key.as_ref()))
            .field("aws_bucket", &self.aws.bucket)
            .field(
                "enforce_collection_ownership",
                &self.enforce_collection_ownership,
            )
            .field("cascade_collection_delete", &self.cascade_collection_delete)
            .field("words_unpaged_cap", &self.words_unpaged_cap)
            .finish()
    }
}
