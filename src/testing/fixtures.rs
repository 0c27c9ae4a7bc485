//! # Test fixtures

use chrono::Utc;
use entity::users;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::types::{PendingIdentity, ProfileFields, ProviderKind, VerifiedIdentity};

/// Builder for user rows
pub struct UserFixture {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            username: "test_user".to_string(),
            email: None,
            password_hash: "!unusable".to_string(),
            is_active: true,
        }
    }
}

impl UserFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    #[must_use]
    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Give the user a usable bcrypt password.
    #[must_use]
    pub fn password(mut self, password: &str) -> Self {
        self.password_hash = bcrypt::hash(password, 4).expect("bcrypt hash");
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub fn to_active_model(self) -> users::ActiveModel {
        let now = Utc::now().naive_utc();
        let email = self
            .email
            .unwrap_or_else(|| format!("{}@example.com", self.username));
        users::ActiveModel {
            username: Set(self.username),
            email: Set(email),
            password_hash: Set(self.password_hash),
            is_active: Set(self.is_active),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    pub async fn insert(self, db: &DatabaseConnection) -> users::Model {
        self.to_active_model().insert(db).await.expect("insert user fixture")
    }
}

/// A verified identity with a token and a little profile data.
#[must_use]
pub fn verified_identity(provider: ProviderKind, external_id: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        provider,
        external_id: external_id.to_string(),
        access_token: Some(format!("token-{external_id}")),
        profile: ProfileFields {
            name: Some(format!("User {external_id}")),
            avatar: Some(format!("https://img.example.com/{external_id}.png")),
            profile_url: None,
        },
    }
}

#[must_use]
pub fn pending_identity(provider: ProviderKind, external_id: &str) -> PendingIdentity {
    verified_identity(provider, external_id).into()
}
