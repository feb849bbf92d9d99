//! Relational storage for users, settings and collections.

pub mod entity;
pub mod mapper;
pub mod migrations;
mod collections_sea_repo;
mod users_sea_repo;

pub use collections_sea_repo::SeaOrmCollectionsRepository;
pub use migrations::Migrator;
pub use users_sea_repo::SeaOrmUsersRepository;

#[cfg(test)]
pub(crate) async fn test_db() -> sea_orm::DatabaseConnection {
    use sea_orm_migration::MigratorTrait;

    let db = sea_orm::Database::connect(
        // One pooled connection, so every query sees the same in-memory database.
        sea_orm::ConnectOptions::new("sqlite::memory:")
            .max_connections(1)
            .min_connections(1)
            .to_owned(),
    )
    .await
    .unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}
