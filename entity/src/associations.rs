//! # Association entity
//!
//! Links one local user to one identity at an external provider. Rows are never
//! hard-deleted; unlinking flips `is_active` and keeps the record for auditing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Association entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "associations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    /// Provider tag, e.g. `facebook` or `twitter`
    pub provider: String,
    /// Provider-scoped identifier, opaque to us
    pub external_id: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub avatar: Option<String>,
    pub profile_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
