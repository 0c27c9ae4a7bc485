//! # Identity types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Supported identity providers. Stored as the lowercase tag in `associations.provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Facebook,
    Twitter,
}

impl ProviderKind {
    pub const ALL: [Self; 2] = [Self::Facebook, Self::Twitter];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facebook" => Ok(Self::Facebook),
            "twitter" => Ok(Self::Twitter),
            _ => Err(AppError::UnknownProvider { name: s.to_string() }),
        }
    }
}

/// Profile fields as returned by the provider. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub profile_url: Option<String>,
}

/// An external identity the provider has vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub provider: ProviderKind,
    /// Provider-opaque, unique per provider only
    pub external_id: String,
    pub access_token: Option<String>,
    pub profile: ProfileFields,
}

/// Identity waiting in the session for the user to pick a username and email.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIdentity {
    pub provider: ProviderKind,
    pub external_id: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub profile: ProfileFields,
}

// Hand-written so access tokens never end up in logs.
impl fmt::Debug for PendingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingIdentity")
            .field("provider", &self.provider)
            .field("external_id", &self.external_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .finish()
    }
}

impl From<VerifiedIdentity> for PendingIdentity {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            provider: identity.provider,
            external_id: identity.external_id,
            access_token: identity.access_token,
            profile: identity.profile,
        }
    }
}

/// Reference to a local user, as far as account resolution cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalUserRef {
    pub id: i32,
    pub username: String,
    pub is_active: bool,
}

impl From<&entity::users::Model> for LocalUserRef {
    fn from(user: &entity::users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_active: user.is_active,
        }
    }
}
