//! Module wiring: configuration in, router out.

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::api::rest::routes;
use crate::config::VocabularyConfig;
use crate::domain::ports::{ObjectStorage, Translator};
use crate::domain::service::{AppServices, Dependencies};
use crate::infra::auth::{BcryptHasher, JwtTokenService};
use crate::infra::aws::load_sdk_config;
use crate::infra::object_storage::{DisabledStorage, S3ObjectStorage};
use crate::infra::pdf::PrintPdfRenderer;
use crate::infra::search::{ElasticClient, ElasticIndexProvisioner, ElasticWordsRepository};
use crate::infra::storage::{Migrator, SeaOrmCollectionsRepository, SeaOrmUsersRepository};
use crate::infra::translate::{AwsTranslator, DisabledTranslator};

/// The vocabulary module with its services built.
pub struct VocabularyModule {
    services: AppServices,
}

impl VocabularyModule {
    /// Build every collaborator from configuration.
    ///
    /// # Errors
    /// Invalid configuration or an Elasticsearch client that cannot be built.
    pub async fn init(config: &VocabularyConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        info!("Initializing vocabulary module");
        config.validate()?;

        let elastic = Arc::new(ElasticClient::new(&config.elastic)?);

        let (translator, storage): (Arc<dyn Translator>, Arc<dyn ObjectStorage>) =
            if config.aws.enabled {
                let sdk = load_sdk_config(&config.aws).await;
                (
                    Arc::new(AwsTranslator::new(&sdk)),
                    Arc::new(S3ObjectStorage::new(&sdk, config.aws.bucket.clone())),
                )
            } else {
                warn!("AWS collaborators disabled: translation fails and PDF uploads are skipped");
                (Arc::new(DisabledTranslator), Arc::new(DisabledStorage))
            };

        let deps = Dependencies {
            users: Arc::new(SeaOrmUsersRepository::new(db.clone())),
            collections: Arc::new(SeaOrmCollectionsRepository::new(db)),
            words: Arc::new(ElasticWordsRepository::new(elastic.clone())),
            index: Arc::new(ElasticIndexProvisioner::new(elastic)),
            hasher: Arc::new(BcryptHasher::new(config.auth.hash_cost)),
            tokens: Arc::new(JwtTokenService::new(&config.auth.secret)),
            translator,
            storage,
            pdf: Arc::new(PrintPdfRenderer),
        };

        let module = Self::from_dependencies(&deps, config);
        info!("Vocabulary module initialized");
        Ok(module)
    }

    /// Build the module around already constructed collaborators.
    #[must_use]
    pub fn from_dependencies(deps: &Dependencies, config: &VocabularyConfig) -> Self {
        Self {
            services: AppServices::new(deps, &config.service_config()),
        }
    }

    /// Apply pending relational schema migrations.
    ///
    /// # Errors
    /// A migration failed.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running vocabulary database migrations");
        Migrator::up(db, None).await?;
        info!("Vocabulary database migrations completed");
        Ok(())
    }

    #[must_use]
    pub fn services(&self) -> &AppServices {
        &self.services
    }

    #[must_use]
    pub fn router(&self) -> Router {
        info!("Registering vocabulary REST routes");
        routes::build_router(&self.services)
    }
}
