//! # Configuration
//!
//! Loading, validation and environment overrides for the service configuration.

mod app_config;
mod database;
mod manager;
mod providers;

pub use app_config::{AppConfig, DestinationsConfig, HttpConfig, ServerConfig, SessionConfig};
pub use database::DatabaseConfig;
pub use manager::{CONFIG_PATH_ENV, ConfigManager};
pub use providers::{FacebookConfig, ProvidersConfig, TwitterConfig};
