//! # Test helpers

use sea_orm::{DatabaseConnection, DbErr};

use crate::config::{AppConfig, DatabaseConfig};

/// Fresh in-memory database with all migrations applied.
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let db = crate::database::init_database(&config)
        .await
        .map_err(|e| DbErr::Custom(e.to_string()))?;
    crate::database::run_migrations(&db).await?;
    Ok(db)
}

/// Default configuration pointed at an in-memory database, both providers enabled.
#[must_use]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.providers.facebook.enabled = true;
    config.providers.facebook.app_id = "fb-app".to_string();
    config.providers.facebook.app_secret = "fb-secret".to_string();
    config.providers.twitter.enabled = true;
    config.providers.twitter.consumer_key = "tw-key".to_string();
    config.providers.twitter.consumer_secret = "tw-secret".to_string();
    config
}

/// Point every provider endpoint at a mock server base URL.
pub fn point_providers_at(config: &mut AppConfig, base: &str) {
    let facebook = &mut config.providers.facebook;
    facebook.authorize_url = format!("{base}/dialog/oauth");
    facebook.token_url = format!("{base}/oauth/access_token");
    facebook.graph_url = base.to_string();

    let twitter = &mut config.providers.twitter;
    twitter.request_token_url = format!("{base}/oauth/request_token");
    twitter.authorize_url = format!("{base}/oauth/authorize");
    twitter.access_token_url = format!("{base}/oauth/access_token");
    twitter.api_base_url = base.to_string();
}
