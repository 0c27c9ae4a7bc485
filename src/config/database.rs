//! # Database configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/social_registration.db?mode=rwc".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create the parent directory of a file-backed sqlite database.
    pub fn ensure_database_path(&self) -> Result<()> {
        let Some(path) = self.sqlite_file_path() else {
            return Ok(());
        };
        let db_path = Path::new(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::config_with_source(
                        format!("cannot create database directory: {}", parent.display()),
                        e,
                    )
                })?;
                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Database,
                    "create_db_dir",
                    &format!("created database directory {}", parent.display())
                );
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// File path part of a sqlite URL, without query parameters.
    fn sqlite_file_path(&self) -> Option<&str> {
        if !self.is_sqlite() || self.is_memory_database() {
            return None;
        }
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        rest.split('?').next().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        let config = DatabaseConfig {
            url: "sqlite://./data/app.db?mode=rwc".into(),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.sqlite_file_path(), Some("./data/app.db"));

        let memory = DatabaseConfig {
            url: "sqlite::memory:".into(),
            ..DatabaseConfig::default()
        };
        assert!(memory.is_memory_database());
        assert_eq!(memory.sqlite_file_path(), None);
        assert!(memory.ensure_database_path().is_ok());
    }
}
