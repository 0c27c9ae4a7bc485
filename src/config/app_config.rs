//! # Application configuration structures

use serde::{Deserialize, Serialize};

use super::{DatabaseConfig, ProvidersConfig};
use crate::types::ProviderKind;

/// Top-level configuration, one section per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub http: HttpConfig,
    pub destinations: DestinationsConfig,
    pub providers: ProvidersConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty disables the CORS layer
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server-side session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Idle lifetime of a session
    pub ttl_seconds: u64,
    pub max_entries: u64,
    /// Mark the cookie `Secure`
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sr_session".to_string(),
            ttl_seconds: 60 * 60 * 24 * 14,
            max_entries: 100_000,
            secure: false,
        }
    }
}

/// Outbound HTTP client settings shared by all provider adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: concat!("social-registration/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Redirect targets. `{provider}` in a template is replaced by the provider tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationsConfig {
    pub home: String,
    pub profile_edit: String,
    pub login: String,
    pub account_setup: String,
    pub registration_complete: String,
    pub registration_closed: String,
}

impl Default for DestinationsConfig {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            profile_edit: "/accounts/profile/edit".to_string(),
            login: "/accounts/login".to_string(),
            account_setup: "/accounts/{provider}/setup".to_string(),
            registration_complete: "/accounts/{provider}/registration-complete".to_string(),
            registration_closed: "/accounts/{provider}/registration-closed".to_string(),
        }
    }
}

impl DestinationsConfig {
    #[must_use]
    pub fn account_setup_for(&self, provider: ProviderKind) -> String {
        self.account_setup.replace("{provider}", provider.as_str())
    }

    #[must_use]
    pub fn registration_complete_for(&self, provider: ProviderKind) -> String {
        self.registration_complete.replace("{provider}", provider.as_str())
    }

    #[must_use]
    pub fn registration_closed_for(&self, provider: ProviderKind) -> String {
        self.registration_closed.replace("{provider}", provider.as_str())
    }
}

impl AppConfig {
    /// Check the loaded configuration for values the service cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.session.ttl_seconds == 0 {
            return Err("session.ttl_seconds must be greater than 0".to_string());
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err("session.cookie_name cannot be empty".to_string());
        }
        if self.http.timeout_seconds == 0 {
            return Err("http.timeout_seconds must be greater than 0".to_string());
        }

        self.providers.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = AppConfig::default();
        config.session.ttl_seconds = 0;
        assert!(config.validate().unwrap_err().contains("ttl_seconds"));

        let mut config = AppConfig::default();
        config.database.url.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_destination_templates() {
        let destinations = DestinationsConfig::default();
        assert_eq!(
            destinations.account_setup_for(ProviderKind::Twitter),
            "/accounts/twitter/setup"
        );
        assert_eq!(
            destinations.registration_closed_for(ProviderKind::Facebook),
            "/accounts/facebook/registration-closed"
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9001

            [session]
            cookie_name = "sid"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.destinations.home, "/");
    }
}
