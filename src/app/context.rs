//! Application context: every long-lived service, built once at startup and
//! shared by the HTTP handlers. Tests swap in their own provider registry.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::accounts::UserDirectory;
use crate::association::SeaOrmAssociationStore;
use crate::config::AppConfig;
use crate::error::Result;
use crate::provider::ProviderRegistry;
use crate::provider::http::build_http_client;
use crate::registration::{RegistrationEvents, RegistrationService};
use crate::resolution::AccountResolver;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub sessions: SessionStore,
    pub providers: ProviderRegistry,
    pub directory: UserDirectory,
    pub resolver: AccountResolver,
    pub registration: RegistrationService,
    pub events: RegistrationEvents,
}

impl AppContext {
    /// Wire services from configuration, creating real provider adapters.
    pub fn build(config: AppConfig, db: DatabaseConnection) -> Result<Self> {
        let http = build_http_client(&config.http)?;
        let providers = ProviderRegistry::from_config(&config.providers, &http)?;
        Ok(Self::with_providers(config, db, providers))
    }

    /// Wire services around an already-built provider registry.
    #[must_use]
    pub fn with_providers(config: AppConfig, db: DatabaseConnection, providers: ProviderRegistry) -> Self {
        let directory = UserDirectory::new(db.clone());
        let events = RegistrationEvents::default();
        let resolver = AccountResolver::new(
            Arc::new(SeaOrmAssociationStore::new(db.clone())),
            directory.clone(),
            config.providers.clone(),
        );
        let registration =
            RegistrationService::new(db.clone(), events.clone(), config.providers.clone());

        Self {
            sessions: SessionStore::new(&config.session),
            config: Arc::new(config),
            db,
            providers,
            directory,
            resolver,
            registration,
            events,
        }
    }
}
