//! # Configuration manager
//!
//! Resolves the config file path, loads the TOML, applies environment overrides
//! and validates the result.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::AppConfig;
use crate::error::{AppError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SOCIAL_REGISTRATION_CONFIG";

/// Environment variables that override single config values, with their config path.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SOCIAL_REGISTRATION_DATABASE_URL", "database.url"),
    ("SOCIAL_REGISTRATION_PORT", "server.port"),
    ("FACEBOOK_APP_ID", "providers.facebook.app_id"),
    ("FACEBOOK_APP_SECRET", "providers.facebook.app_secret"),
    ("TWITTER_CONSUMER_KEY", "providers.twitter.consumer_key"),
    ("TWITTER_CONSUMER_SECRET", "providers.twitter.consumer_secret"),
];

/// Loaded and validated configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
    source: PathBuf,
}

impl ConfigManager {
    /// Load configuration, preferring `cli_path`, then `SOCIAL_REGISTRATION_CONFIG`,
    /// then `config/config.{RUST_ENV}.toml`.
    pub fn new(cli_path: Option<PathBuf>) -> Result<Self> {
        let path = cli_path
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
                PathBuf::from(format!("config/config.{env}.toml"))
            });

        Self::from_file(path)
    }

    /// Load configuration from a specific file, applying process env overrides.
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let mut config = Self::load_config_file(config_path)?;

        let overrides = Self::build_env_overrides();
        Self::apply_env_overrides(&mut config, &overrides)?;

        config
            .validate()
            .map_err(|e| crate::config_error!("invalid configuration in {}: {e}", config_path.display()))?;

        info!(
            config_file = %config_path.display(),
            env_overrides = overrides.len(),
            "configuration loaded"
        );

        Ok(Self {
            config,
            source: config_path.to_path_buf(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    fn load_config_file(path: &Path) -> Result<AppConfig> {
        crate::ensure_config!(path.exists(), "config file does not exist: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config_with_source(format!("failed to read config file: {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| {
            AppError::config_with_source(
                format!("TOML parse failed for {}: {e}", path.display()),
                e,
            )
        })
    }

    /// Collect the known override variables present in the process environment.
    fn build_env_overrides() -> HashMap<String, String> {
        let overrides: HashMap<String, String> = ENV_OVERRIDES
            .iter()
            .filter_map(|(var, path)| env::var(var).ok().map(|value| ((*path).to_string(), value)))
            .collect();

        debug!("found {} environment overrides", overrides.len());
        overrides
    }

    /// Apply `config.path -> value` overrides on top of the file contents.
    pub fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "applying override: {} = {}",
                path,
                if path.contains("secret") { "***" } else { value }
            );
            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["database", "url"] => config.database.url = value.to_string(),
            ["server", "port"] => {
                config.server.port = value.parse().map_err(|e| {
                    AppError::config_with_source(format!("invalid port: {value}"), e)
                })?;
            }
            ["providers", "facebook", "app_id"] => {
                config.providers.facebook.app_id = value.to_string();
            }
            ["providers", "facebook", "app_secret"] => {
                config.providers.facebook.app_secret = value.to_string();
            }
            ["providers", "twitter", "consumer_key"] => {
                config.providers.twitter.consumer_key = value.to_string();
            }
            ["providers", "twitter", "consumer_secret"] => {
                config.providers.twitter.consumer_secret = value.to_string();
            }
            _ => warn!("unknown config path, ignoring override: {}", path),
        }

        Ok(())
    }
}
