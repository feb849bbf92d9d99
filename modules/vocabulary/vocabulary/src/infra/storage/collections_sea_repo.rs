//! `SeaORM` repository implementation for collections.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use time::OffsetDateTime;
use vocabulary_sdk::{Collection, NewCollection};

use super::entity::collection;
use crate::domain::repos::CollectionsRepository;

pub struct SeaOrmCollectionsRepository {
    db: DatabaseConnection,
}

impl SeaOrmCollectionsRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CollectionsRepository for SeaOrmCollectionsRepository {
    async fn create(&self, owner_id: i64, new: &NewCollection) -> anyhow::Result<Collection> {
        let model = collection::ActiveModel {
            name: ActiveValue::Set(new.name.clone()),
            owner_id: ActiveValue::Set(owner_id),
            lang_from: ActiveValue::Set(new.lang_from.clone()),
            lang_to: ActiveValue::Set(new.lang_to.clone()),
            pdf_url: ActiveValue::Set(None),
            created_at: ActiveValue::Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Collection>> {
        Ok(collection::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Collection>> {
        Ok(collection::Entity::find()
            .filter(collection::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Collection>> {
        let rows = collection::Entity::find()
            .filter(collection::Column::OwnerId.eq(owner_id))
            .order_by_asc(collection::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> anyhow::Result<Vec<Collection>> {
        let rows = collection::Entity::find()
            .order_by_asc(collection::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_name(&self, id: i64, name: &str) -> anyhow::Result<Option<Collection>> {
        let Some(existing) = collection::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut active: collection::ActiveModel = existing.into();
        active.name = ActiveValue::Set(name.to_owned());
        Ok(Some(active.update(&self.db).await?.into()))
    }

    async fn set_pdf_url(&self, id: i64, url: &str) -> anyhow::Result<()> {
        collection::Entity::update_many()
            .col_expr(collection::Column::PdfUrl, Expr::value(url.to_owned()))
            .filter(collection::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = collection::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
