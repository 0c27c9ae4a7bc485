//! # Association store
//!
//! Durable mapping of (local user, provider, external identifier). Uniqueness of
//! (provider, external identifier) is enforced by the database, never by a
//! check-then-write in application code.

mod store;

pub use store::{AssociationStore, SeaOrmAssociationStore, claim_association};

use crate::types::{PendingIdentity, ProfileFields, ProviderKind, VerifiedIdentity};

/// A stored association row.
pub type Association = entity::associations::Model;

/// Fields needed to create or reclaim an association.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAssociation {
    pub user_id: i32,
    pub provider: ProviderKind,
    pub external_id: String,
    pub metadata: AssociationMetadata,
}

impl std::fmt::Debug for NewAssociation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAssociation")
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("external_id", &self.external_id)
            .finish_non_exhaustive()
    }
}

impl NewAssociation {
    #[must_use]
    pub fn from_verified(user_id: i32, identity: &VerifiedIdentity) -> Self {
        Self {
            user_id,
            provider: identity.provider,
            external_id: identity.external_id.clone(),
            metadata: AssociationMetadata::from_parts(identity.access_token.clone(), &identity.profile),
        }
    }

    #[must_use]
    pub fn from_pending(user_id: i32, pending: &PendingIdentity) -> Self {
        Self {
            user_id,
            provider: pending.provider,
            external_id: pending.external_id.clone(),
            metadata: AssociationMetadata::from_parts(pending.access_token.clone(), &pending.profile),
        }
    }
}

/// Volatile fields refreshed on every successful authentication.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AssociationMetadata {
    pub access_token: Option<String>,
    pub avatar: Option<String>,
    pub profile_url: Option<String>,
}

impl AssociationMetadata {
    #[must_use]
    pub fn from_parts(access_token: Option<String>, profile: &ProfileFields) -> Self {
        Self {
            access_token,
            avatar: profile.avatar.clone(),
            profile_url: profile.profile_url.clone(),
        }
    }
}

impl From<&VerifiedIdentity> for AssociationMetadata {
    fn from(identity: &VerifiedIdentity) -> Self {
        Self::from_parts(identity.access_token.clone(), &identity.profile)
    }
}
