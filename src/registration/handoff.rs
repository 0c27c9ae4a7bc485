use sea_orm::{DatabaseConnection, TransactionTrait};

use super::validation::{validate_email_format, validate_username_format};
use super::{RegistrationEvents, UserRegistered, ValidationErrors};
use crate::accounts::{User, UserDirectory, insert_external_user};
use crate::association::{NewAssociation, claim_association};
use crate::config::ProvidersConfig;
use crate::error::{AppError, Result};
use crate::types::{PendingIdentity, ProviderKind};
use crate::{linfo, lwarn, logging::{LogComponent, LogStage}};

/// Creates local users for identities staged by the resolver.
#[derive(Clone)]
pub struct RegistrationService {
    db: DatabaseConnection,
    directory: UserDirectory,
    events: RegistrationEvents,
    providers: ProvidersConfig,
}

impl RegistrationService {
    #[must_use]
    pub fn new(db: DatabaseConnection, events: RegistrationEvents, providers: ProvidersConfig) -> Self {
        Self {
            directory: UserDirectory::new(db.clone()),
            db,
            events,
            providers,
        }
    }

    #[must_use]
    pub fn registration_open(&self, provider: ProviderKind) -> bool {
        self.providers.registration_open(provider)
    }

    /// Check a username and email against the format rules and existing users.
    /// Returns the trimmed values.
    ///
    /// The lookups only produce friendly messages. Concurrent registrations are
    /// settled by the case-insensitive unique keys on the users table.
    pub async fn validate(&self, username: &str, email: &str) -> Result<(String, String)> {
        let username = username.trim();
        let email = email.trim();
        let mut errors = ValidationErrors::default();

        validate_username_format(username, &mut errors);
        validate_email_format(email, &mut errors);

        if errors.field("username").is_empty() && self.directory.username_taken(username).await? {
            errors.add("username", "This username is already in use.");
        }
        if errors.field("email").is_empty() && self.directory.email_taken(email).await? {
            errors.add("email", "This email address is already in use.");
        }

        errors.into_result()?;
        Ok((username.to_string(), email.to_string()))
    }

    /// Create the user and its association in one transaction, then publish
    /// [`UserRegistered`]. Nothing is written when any step fails.
    pub async fn complete_registration(
        &self,
        pending: PendingIdentity,
        username: &str,
        email: &str,
    ) -> Result<User> {
        let provider = pending.provider;
        if !self.registration_open(provider) {
            return Err(AppError::RegistrationClosed { provider });
        }

        let (username, email) = self.validate(username, email).await?;

        let txn = self.db.begin().await?;
        let created = async {
            let user = insert_external_user(&txn, &username, &email).await?;
            claim_association(&txn, &NewAssociation::from_pending(user.id, &pending)).await?;
            Ok::<_, AppError>(user)
        }
        .await;

        let user = match created {
            Ok(user) => {
                txn.commit().await?;
                user
            }
            Err(err) => {
                txn.rollback().await?;
                lwarn!(
                    "system",
                    LogStage::Registration,
                    LogComponent::Registration,
                    "complete_registration",
                    &format!("registration rolled back: {err}"),
                    provider = provider.as_str()
                );
                return Err(err);
            }
        };

        linfo!(
            "system",
            LogStage::Registration,
            LogComponent::Registration,
            "complete_registration",
            "user registered",
            user_id = user.id,
            provider = provider.as_str()
        );

        self.events.publish(UserRegistered {
            user_id: user.id,
            username: user.username.clone(),
            provider,
        });

        Ok(user)
    }
}
