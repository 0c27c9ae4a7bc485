//! # Database
//!
//! Connection setup and migrations.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::{lerror, linfo, lwarn, logging::{LogComponent, LogStage}};

/// Open a connection pool for the configured database.
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    config.ensure_database_path()?;

    linfo!(
        "system",
        LogStage::Db,
        LogComponent::Database,
        "connect",
        "connecting to database",
        sqlite = config.is_sqlite(),
        in_memory = config.is_memory_database()
    );

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    // Every in-memory connection is its own database; share one.
    if config.is_memory_database() {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options)
        .await
        .map_err(|e| AppError::database_with_source("failed to connect to database", e))?;

    linfo!("system", LogStage::Db, LogComponent::Database, "connected", "database connected");
    Ok(db)
}

/// Apply all pending migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> std::result::Result<(), DbErr> {
    linfo!("system", LogStage::Db, LogComponent::Database, "migrate", "running migrations");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            linfo!("system", LogStage::Db, LogComponent::Database, "migrate", "migrations applied");
            Ok(())
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Db,
                LogComponent::Database,
                "migrate",
                &format!("migration failed: {e}")
            );
            Err(e)
        }
    }
}

/// Number of migrations not yet applied.
pub async fn check_database_status(db: &DatabaseConnection) -> std::result::Result<usize, DbErr> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;
    if !pending.is_empty() {
        lwarn!(
            "system",
            LogStage::Db,
            LogComponent::Database,
            "status",
            &format!("{} migrations pending", pending.len())
        );
    }
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_migrates() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let db = init_database(&config).await.unwrap();

        assert_eq!(check_database_status(&db).await.unwrap(), 2);
        run_migrations(&db).await.unwrap();
        assert_eq!(check_database_status(&db).await.unwrap(), 0);
    }
}
