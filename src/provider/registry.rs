//! # Provider registry
//!
//! Holds one adapter per enabled provider, built once at startup from config.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;

use super::{FacebookProvider, ProviderClient, TwitterProvider};
use crate::config::ProvidersConfig;
use crate::error::{AppError, Result};
use crate::types::ProviderKind;
use crate::{linfo, logging::{LogComponent, LogStage}};

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    /// Build adapters for every enabled provider.
    pub fn from_config(config: &ProvidersConfig, http: &Client) -> Result<Self> {
        let mut registry = Self::default();

        if config.facebook.enabled {
            registry = registry.with_client(Arc::new(FacebookProvider::new(&config.facebook, http.clone())?));
        }
        if config.twitter.enabled {
            registry = registry.with_client(Arc::new(TwitterProvider::new(&config.twitter, http.clone())?));
        }

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Provider,
            "registry",
            "provider adapters ready",
            count = registry.clients.len()
        );
        Ok(registry)
    }

    /// Register or replace the adapter for its provider.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn ProviderClient>) -> Self {
        self.clients.insert(client.kind(), client);
        self
    }

    /// Adapter for a provider, if it is enabled.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn ProviderClient>> {
        self.clients
            .get(&kind)
            .cloned()
            .ok_or_else(|| AppError::UnknownProvider {
                name: kind.to_string(),
            })
    }

    #[must_use]
    pub fn enabled(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.clients.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::provider::http::build_http_client;
    use crate::testing::test_config;

    #[test]
    fn test_registry_only_contains_enabled_providers() {
        let http = build_http_client(&HttpConfig::default()).unwrap();
        let mut config = test_config();
        config.providers.twitter.enabled = false;

        let registry = ProviderRegistry::from_config(&config.providers, &http).unwrap();
        assert_eq!(registry.enabled(), vec![ProviderKind::Facebook]);
        assert!(registry.get(ProviderKind::Facebook).is_ok());
        assert!(matches!(
            registry.get(ProviderKind::Twitter),
            Err(AppError::UnknownProvider { .. })
        ));
    }
}
