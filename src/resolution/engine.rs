use std::sync::Arc;

use crate::accounts::UserDirectory;
use crate::association::{AssociationMetadata, AssociationStore, NewAssociation};
use crate::config::ProvidersConfig;
use crate::error::{AppError, Result};
use crate::session::Session;
use crate::types::{ProviderKind, VerifiedIdentity};
use crate::{linfo, lwarn, logging::{LogComponent, LogStage}};

use super::Outcome;

/// Decides what a verified identity means for the requesting session.
#[derive(Clone)]
pub struct AccountResolver {
    associations: Arc<dyn AssociationStore>,
    directory: UserDirectory,
    providers: ProvidersConfig,
}

impl AccountResolver {
    #[must_use]
    pub fn new(
        associations: Arc<dyn AssociationStore>,
        directory: UserDirectory,
        providers: ProvidersConfig,
    ) -> Self {
        Self {
            associations,
            directory,
            providers,
        }
    }

    #[must_use]
    pub fn associations(&self) -> &Arc<dyn AssociationStore> {
        &self.associations
    }

    /// Resolve a verified identity against the store and the session.
    ///
    /// An inactive owning user yields [`AppError::InactiveAccount`] and leaves the
    /// session untouched.
    pub async fn resolve(&self, identity: VerifiedIdentity, session: &Session) -> Result<Outcome> {
        let provider = identity.provider;

        if let Some(association) = self
            .associations
            .find_by_identity(provider, &identity.external_id)
            .await?
        {
            let owner = self
                .directory
                .find_by_id(association.user_id)
                .await?
                .ok_or_else(|| {
                    crate::internal_error!("association {} points at a missing user", association.id)
                })?;

            if !owner.is_active {
                lwarn!(
                    session.id(),
                    LogStage::Resolution,
                    LogComponent::Resolver,
                    "resolve",
                    "login refused for inactive account",
                    provider = provider.as_str(),
                    user_id = owner.id
                );
                return Err(AppError::inactive_account(format!(
                    "account '{}' is inactive",
                    owner.username
                )));
            }

            let association = self
                .associations
                .update_metadata(&association, AssociationMetadata::from(&identity))
                .await?;
            session.login(owner.id).await;
            self.directory.record_login(&owner).await?;

            linfo!(
                session.id(),
                LogStage::Resolution,
                LogComponent::Resolver,
                "resolve",
                "granted",
                provider = provider.as_str(),
                user_id = owner.id
            );
            return Ok(Outcome::Granted {
                user_id: owner.id,
                association_id: association.id,
            });
        }

        match session.user_id().await {
            Some(user_id) => {
                let association = self
                    .associations
                    .create(NewAssociation::from_verified(user_id, &identity))
                    .await?;
                linfo!(
                    session.id(),
                    LogStage::Resolution,
                    LogComponent::Resolver,
                    "resolve",
                    "linked",
                    provider = provider.as_str(),
                    user_id = user_id
                );
                Ok(Outcome::Linked {
                    user_id,
                    association_id: association.id,
                })
            }
            None if !self.providers.registration_open(provider) => {
                linfo!(
                    session.id(),
                    LogStage::Resolution,
                    LogComponent::Resolver,
                    "resolve",
                    "unknown identity while registration is closed",
                    provider = provider.as_str()
                );
                Ok(Outcome::RegistrationClosed { provider })
            }
            None => {
                session.stage(identity.into()).await;
                linfo!(
                    session.id(),
                    LogStage::Resolution,
                    LogComponent::Resolver,
                    "resolve",
                    "staged for registration",
                    provider = provider.as_str()
                );
                Ok(Outcome::Staged { provider })
            }
        }
    }

    /// Deactivate the session user's link to `provider`. Provider-side grants
    /// are left alone.
    pub async fn unlink(&self, session: &Session, provider: ProviderKind) -> Result<()> {
        let user_id = session.user_id().await.ok_or(AppError::NotAuthenticated)?;
        self.associations.deactivate(user_id, provider).await?;

        linfo!(
            session.id(),
            LogStage::Resolution,
            LogComponent::Resolver,
            "unlink",
            "provider unlinked",
            provider = provider.as_str(),
            user_id = user_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::SeaOrmAssociationStore;
    use crate::testing::{UserFixture, create_test_db, verified_identity};
    use entity::associations;
    use pretty_assertions::assert_eq;
    use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

    fn resolver(db: &DatabaseConnection, providers: ProvidersConfig) -> AccountResolver {
        AccountResolver::new(
            Arc::new(SeaOrmAssociationStore::new(db.clone())),
            UserDirectory::new(db.clone()),
            providers,
        )
    }

    async fn row_count(db: &DatabaseConnection) -> u64 {
        associations::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_unknown_identity_on_anonymous_session_is_staged() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let session = Session::detached();

        let outcome = resolver
            .resolve(verified_identity(ProviderKind::Twitter, "120889797"), &session)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Staged { provider: ProviderKind::Twitter });
        let pending = session.peek_pending().await.unwrap();
        assert_eq!(pending.external_id, "120889797");
        assert!(!session.is_authenticated().await);
        assert_eq!(row_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_known_identity_is_granted_repeatedly() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let alice = UserFixture::new().username("alice").insert(&db).await;
        resolver
            .associations()
            .create(NewAssociation::from_verified(
                alice.id,
                &verified_identity(ProviderKind::Twitter, "120889797"),
            ))
            .await
            .unwrap();

        for _ in 0..2 {
            let session = Session::detached();
            let outcome = resolver
                .resolve(verified_identity(ProviderKind::Twitter, "120889797"), &session)
                .await
                .unwrap();
            assert!(matches!(outcome, Outcome::Granted { user_id, .. } if user_id == alice.id));
            assert_eq!(session.user_id().await, Some(alice.id));
        }
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_grant_refreshes_metadata() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let user = UserFixture::new().insert(&db).await;
        resolver
            .associations()
            .create(NewAssociation::from_verified(user.id, &verified_identity(ProviderKind::Facebook, "9")))
            .await
            .unwrap();

        let mut fresh = verified_identity(ProviderKind::Facebook, "9");
        fresh.access_token = Some("rotated".into());
        fresh.profile.avatar = Some("https://img.example.com/new.png".into());
        resolver.resolve(fresh, &Session::detached()).await.unwrap();

        let stored = resolver
            .associations()
            .find_by_identity(ProviderKind::Facebook, "9")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("rotated"));
        assert_eq!(stored.avatar.as_deref(), Some("https://img.example.com/new.png"));
    }

    #[tokio::test]
    async fn test_inactive_owner_is_denied() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let user = UserFixture::new().inactive().insert(&db).await;
        resolver
            .associations()
            .create(NewAssociation::from_verified(user.id, &verified_identity(ProviderKind::Twitter, "1")))
            .await
            .unwrap();

        let session = Session::detached();
        let err = resolver
            .resolve(verified_identity(ProviderKind::Twitter, "1"), &session)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InactiveAccount { .. }));
        assert!(!session.is_authenticated().await);
        assert!(session.peek_pending().await.is_none());
    }

    #[tokio::test]
    async fn test_authenticated_session_links_without_relogin() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let session = Session::detached();
        session.login(bob.id).await;

        let outcome = resolver
            .resolve(verified_identity(ProviderKind::Facebook, "555"), &session)
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Linked { user_id, .. } if user_id == bob.id));
        assert_eq!(outcome.destination(), super::super::Destination::ProfileEdit);
        assert_eq!(session.user_id().await, Some(bob.id));
        assert!(session.peek_pending().await.is_none());
    }

    #[tokio::test]
    async fn test_unlink_then_resolve_links_again() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let session = Session::detached();
        session.login(bob.id).await;

        resolver
            .resolve(verified_identity(ProviderKind::Facebook, "555"), &session)
            .await
            .unwrap();
        resolver.unlink(&session, ProviderKind::Facebook).await.unwrap();
        assert!(
            resolver
                .associations()
                .find_by_identity(ProviderKind::Facebook, "555")
                .await
                .unwrap()
                .is_none()
        );

        let outcome = resolver
            .resolve(verified_identity(ProviderKind::Facebook, "555"), &session)
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Linked { .. }));
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_unlink_errors() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());

        let err = resolver
            .unlink(&Session::detached(), ProviderKind::Twitter)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));

        let user = UserFixture::new().insert(&db).await;
        let session = Session::detached();
        session.login(user.id).await;
        let err = resolver.unlink(&session, ProviderKind::Twitter).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_identity_owned_by_inactive_user_blocks_logged_in_session() {
        let db = create_test_db().await.unwrap();
        let resolver = resolver(&db, ProvidersConfig::default());
        let first = UserFixture::new().username("first").insert(&db).await;
        let second = UserFixture::new().username("second").inactive().insert(&db).await;
        resolver
            .associations()
            .create(NewAssociation::from_verified(second.id, &verified_identity(ProviderKind::Twitter, "7")))
            .await
            .unwrap();

        // The identity is owned, so resolution takes the grant path and the
        // inactive owner blocks it even though `first` is logged in.
        let session = Session::detached();
        session.login(first.id).await;
        let err = resolver
            .resolve(verified_identity(ProviderKind::Twitter, "7"), &session)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InactiveAccount { .. }));
        assert_eq!(session.user_id().await, Some(first.id));
    }

    #[tokio::test]
    async fn test_closed_registration_does_not_stage() {
        let db = create_test_db().await.unwrap();
        let mut providers = ProvidersConfig::default();
        providers.twitter.registration_open = false;
        let resolver = resolver(&db, providers);
        let session = Session::detached();

        let outcome = resolver
            .resolve(verified_identity(ProviderKind::Twitter, "3"), &session)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::RegistrationClosed { provider: ProviderKind::Twitter });
        assert!(session.peek_pending().await.is_none());
    }
}
