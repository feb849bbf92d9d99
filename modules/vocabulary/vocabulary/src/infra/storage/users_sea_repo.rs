//! `SeaORM` repository implementation for users and their settings.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use time::OffsetDateTime;
use vocabulary_sdk::{User, UserSettings};

use super::entity::{collection, user, user_settings};
use super::mapper::stored_user;
use crate::domain::repos::{StoredUser, UsersRepository};

pub struct SeaOrmUsersRepository {
    db: DatabaseConnection,
}

impl SeaOrmUsersRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UsersRepository for SeaOrmUsersRepository {
    async fn create_with_settings(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let txn = self.db.begin().await?;

        let user = user::ActiveModel {
            name: ActiveValue::Set(name.to_owned()),
            email: ActiveValue::Set(email.to_owned()),
            password: ActiveValue::Set(password_hash.to_owned()),
            is_super: ActiveValue::Set(false),
            created_at: ActiveValue::Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let settings = user_settings::ActiveModel {
            user_id: ActiveValue::Set(user.id),
            language: ActiveValue::Set(String::new()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(stored_user(user, Some(settings)).user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .find_also_related(user_settings::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(u, s)| stored_user(u, s)))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id)
            .find_also_related(user_settings::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(u, s)| stored_user(u, s).user))
    }

    async fn find_by_collection_id(&self, collection_id: i64) -> anyhow::Result<Option<User>> {
        let Some(owned) = collection::Entity::find_by_id(collection_id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        self.find_by_id(owned.owner_id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows = user::Entity::find()
            .find_also_related(user_settings::Entity)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(u, s)| stored_user(u, s).user).collect())
    }

    async fn update_language(
        &self,
        user_id: i64,
        language: &str,
    ) -> anyhow::Result<Option<UserSettings>> {
        let Some(existing) = user_settings::Entity::find()
            .filter(user_settings::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active: user_settings::ActiveModel = existing.into();
        active.language = ActiveValue::Set(language.to_owned());
        let updated = active.update(&self.db).await?;
        Ok(Some(updated.into()))
    }
}
