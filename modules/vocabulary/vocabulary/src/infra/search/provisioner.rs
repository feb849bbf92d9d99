use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use super::client::ElasticClient;
use super::naming::{alias_filter, collection_alias, index_definition, user_index};
use crate::domain::repos::SearchIndexProvisioner;

/// Creates user indices and collection aliases, skipping ones that already exist.
pub struct ElasticIndexProvisioner {
    client: Arc<ElasticClient>,
}

impl ElasticIndexProvisioner {
    #[must_use]
    pub fn new(client: Arc<ElasticClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchIndexProvisioner for ElasticIndexProvisioner {
    async fn ensure_user_index(&self, user_id: i64) -> anyhow::Result<()> {
        let index = user_index(user_id)?;
        if self.client.exists(&format!("/{index}")).await? {
            debug!(%index, "User index already exists");
            return Ok(());
        }

        match self
            .client
            .send_json(Method::PUT, &format!("/{index}"), Some(&index_definition()))
            .await
        {
            Ok(_) => {
                info!(%index, "Created user index");
                Ok(())
            }
            // Lost a creation race with a concurrent request.
            Err(e) if e.kind() == Some("resource_already_exists_exception") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_collection_alias(&self, user_id: i64, collection_id: i64) -> anyhow::Result<()> {
        let index = user_index(user_id)?;
        let alias = collection_alias(user_id, collection_id)?;
        if self
            .client
            .exists(&format!("/{index}/_alias/{alias}"))
            .await?
        {
            debug!(%alias, "Collection alias already exists");
            return Ok(());
        }

        let body = json!({
            "actions": [
                { "add": { "index": index, "alias": alias, "filter": alias_filter(collection_id) } }
            ]
        });
        self.client
            .send_json(Method::POST, "/_aliases", Some(&body))
            .await?;
        info!(%alias, "Created collection alias");
        Ok(())
    }

    async fn remove_collection_alias(&self, user_id: i64, collection_id: i64) -> anyhow::Result<()> {
        let index = user_index(user_id)?;
        let alias = collection_alias(user_id, collection_id)?;
        match self
            .client
            .send_json(Method::DELETE, &format!("/{index}/_alias/{alias}"), None)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
