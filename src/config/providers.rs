//! # Identity provider configuration
//!
//! Credentials and endpoints for each provider adapter. Endpoint URLs are
//! configurable so tests and staging environments can point at stand-ins.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::ProviderKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub facebook: FacebookConfig,
    pub twitter: TwitterConfig,
}

impl ProvidersConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.facebook.enabled {
            self.facebook.validate()?;
        }
        if self.twitter.enabled {
            self.twitter.validate()?;
        }
        Ok(())
    }

    /// Whether new accounts may be created through `provider`.
    #[must_use]
    pub const fn registration_open(&self, provider: ProviderKind) -> bool {
        match provider {
            ProviderKind::Facebook => self.facebook.registration_open,
            ProviderKind::Twitter => self.twitter.registration_open,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self, provider: ProviderKind) -> bool {
        match provider {
            ProviderKind::Facebook => self.facebook.enabled,
            ProviderKind::Twitter => self.twitter.enabled,
        }
    }

    /// Where the provider sends the browser back to after authorization.
    #[must_use]
    pub fn callback_url(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::Facebook => &self.facebook.callback_url,
            ProviderKind::Twitter => &self.twitter.callback_url,
        }
    }
}

/// Facebook (OAuth 2.0 + Graph API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacebookConfig {
    pub enabled: bool,
    pub app_id: String,
    #[serde(skip_serializing)]
    pub app_secret: String,
    /// Absolute URL of our `/accounts/facebook/authenticate` route
    pub callback_url: String,
    pub scopes: Vec<String>,
    pub registration_open: bool,
    pub authorize_url: String,
    pub token_url: String,
    pub graph_url: String,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_id: String::new(),
            app_secret: String::new(),
            callback_url: "http://127.0.0.1:8000/accounts/facebook/authenticate".to_string(),
            scopes: vec!["email".to_string()],
            registration_open: true,
            authorize_url: "https://www.facebook.com/dialog/oauth".to_string(),
            token_url: "https://graph.facebook.com/oauth/access_token".to_string(),
            graph_url: "https://graph.facebook.com".to_string(),
        }
    }
}

impl FacebookConfig {
    fn validate(&self) -> Result<(), String> {
        if self.app_id.trim().is_empty() || self.app_secret.trim().is_empty() {
            return Err("providers.facebook requires app_id and app_secret".to_string());
        }
        check_urls(
            "providers.facebook",
            &[
                ("callback_url", &self.callback_url),
                ("authorize_url", &self.authorize_url),
                ("token_url", &self.token_url),
                ("graph_url", &self.graph_url),
            ],
        )
    }
}

/// Twitter (OAuth 1.0a + REST API v1.1)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub enabled: bool,
    pub consumer_key: String,
    #[serde(skip_serializing)]
    pub consumer_secret: String,
    /// Absolute URL of our `/accounts/twitter/authenticate` route
    pub callback_url: String,
    pub registration_open: bool,
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
    pub api_base_url: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            consumer_key: String::new(),
            consumer_secret: String::new(),
            callback_url: "http://127.0.0.1:8000/accounts/twitter/authenticate".to_string(),
            registration_open: true,
            request_token_url: "https://api.twitter.com/oauth/request_token".to_string(),
            authorize_url: "https://api.twitter.com/oauth/authorize".to_string(),
            access_token_url: "https://api.twitter.com/oauth/access_token".to_string(),
            api_base_url: "https://api.twitter.com".to_string(),
        }
    }
}

impl TwitterConfig {
    fn validate(&self) -> Result<(), String> {
        if self.consumer_key.trim().is_empty() || self.consumer_secret.trim().is_empty() {
            return Err("providers.twitter requires consumer_key and consumer_secret".to_string());
        }
        check_urls(
            "providers.twitter",
            &[
                ("callback_url", &self.callback_url),
                ("request_token_url", &self.request_token_url),
                ("authorize_url", &self.authorize_url),
                ("access_token_url", &self.access_token_url),
                ("api_base_url", &self.api_base_url),
            ],
        )
    }
}

fn check_urls(section: &str, urls: &[(&str, &String)]) -> Result<(), String> {
    for (name, value) in urls {
        Url::parse(value).map_err(|e| format!("{section}.{name} is not a valid URL: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_providers_skip_validation() {
        assert!(ProvidersConfig::default().validate().is_ok());
    }

    #[test]
    fn test_enabled_provider_requires_credentials() {
        let mut providers = ProvidersConfig::default();
        providers.twitter.enabled = true;
        let err = providers.validate().unwrap_err();
        assert!(err.contains("consumer_key"));

        providers.twitter.consumer_key = "key".into();
        providers.twitter.consumer_secret = "secret".into();
        assert!(providers.validate().is_ok());

        providers.twitter.access_token_url = "not a url".into();
        assert!(providers.validate().unwrap_err().contains("access_token_url"));
    }

    #[test]
    fn test_registration_open_defaults_true() {
        let providers = ProvidersConfig::default();
        assert!(providers.registration_open(ProviderKind::Facebook));
        assert!(providers.registration_open(ProviderKind::Twitter));
    }
}
