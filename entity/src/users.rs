//! # User entity
//!
//! Local account records. Accounts created through an external provider carry an
//! unusable password hash and can only sign in through their associations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Prefix marking a password hash that can never verify.
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// User entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::associations::Entity")]
    Associations,
}

impl Related<super::associations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Associations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the stored hash can ever match a password.
    pub fn has_usable_password(&self) -> bool {
        !self.password_hash.is_empty() && !self.password_hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
    }
}
