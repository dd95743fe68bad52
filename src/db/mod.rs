//! Persistence for generated items and collections
pub mod entities;
pub mod migrations;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Opens (creating if needed) the SQLite database at `path`.
pub async fn connect_db(path: &str) -> Result<DatabaseConnection, DbErr> {
    let url = format!("sqlite://{}?mode=rwc", path);
    Database::connect(url).await
}

/// In-memory SQLite with every migration applied.
#[cfg(test)]
pub(crate) async fn connect_test_db() -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = Database::connect("sqlite::memory:").await?;
    migrations::Migrator::up(&db, None).await?;
    Ok(db)
}
