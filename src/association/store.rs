use async_trait::async_trait;
use chrono::Utc;
use entity::associations;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use super::{Association, AssociationMetadata, NewAssociation};
use crate::error::{AppError, Result};
use crate::types::ProviderKind;
use crate::{ldebug, linfo, lwarn, logging::{LogComponent, LogStage}};

/// Contract the resolver and registration code rely on.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Active association for an external identity.
    async fn find_by_identity(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<Association>>;

    /// The user's active association for `provider`.
    async fn find_for_user(&self, user_id: i32, provider: ProviderKind)
    -> Result<Option<Association>>;

    /// Every association the user ever held for `provider`, newest first.
    async fn history_for_user(&self, user_id: i32, provider: ProviderKind)
    -> Result<Vec<Association>>;

    /// Bind an external identity to a user.
    ///
    /// Fails with [`AppError::DuplicateIdentity`] when another user already holds
    /// the identity. Binding an identity the user already holds returns the
    /// existing row.
    async fn create(&self, new: NewAssociation) -> Result<Association>;

    /// Sever the user's active link for `provider`, keeping the row.
    async fn deactivate(&self, user_id: i32, provider: ProviderKind) -> Result<bool>;

    /// Refresh token, avatar and profile URL.
    async fn update_metadata(
        &self,
        association: &Association,
        metadata: AssociationMetadata,
    ) -> Result<Association>;
}

/// Association store on top of sea-orm.
#[derive(Debug, Clone)]
pub struct SeaOrmAssociationStore {
    db: DatabaseConnection,
}

impl SeaOrmAssociationStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Row for an identity regardless of its active flag.
    async fn find_any<C: ConnectionTrait>(
        conn: &C,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<Association>> {
        Ok(associations::Entity::find()
            .filter(associations::Column::Provider.eq(provider.as_str()))
            .filter(associations::Column::ExternalId.eq(external_id))
            .one(conn)
            .await?)
    }
}

/// Claim an external identity for `new.user_id` on an open connection or transaction.
///
/// The user's other active association for the same provider is deactivated. An
/// inactive row for the identity is reclaimed with a conditional update; otherwise
/// a row is inserted and the unique index arbitrates races.
pub async fn claim_association<C: ConnectionTrait>(
    conn: &C,
    new: &NewAssociation,
) -> Result<Association> {
    let now = Utc::now().naive_utc();
    let provider = new.provider.as_str();

    associations::Entity::update_many()
        .col_expr(associations::Column::IsActive, Expr::value(false))
        .col_expr(associations::Column::UpdatedAt, Expr::value(now))
        .filter(associations::Column::UserId.eq(new.user_id))
        .filter(associations::Column::Provider.eq(provider))
        .filter(associations::Column::ExternalId.ne(new.external_id.as_str()))
        .filter(associations::Column::IsActive.eq(true))
        .exec(conn)
        .await?;

    let reclaimed = associations::Entity::update_many()
        .col_expr(associations::Column::UserId, Expr::value(new.user_id))
        .col_expr(associations::Column::IsActive, Expr::value(true))
        .col_expr(
            associations::Column::AccessToken,
            Expr::value(new.metadata.access_token.clone()),
        )
        .col_expr(associations::Column::Avatar, Expr::value(new.metadata.avatar.clone()))
        .col_expr(
            associations::Column::ProfileUrl,
            Expr::value(new.metadata.profile_url.clone()),
        )
        .col_expr(associations::Column::UpdatedAt, Expr::value(now))
        .filter(associations::Column::Provider.eq(provider))
        .filter(associations::Column::ExternalId.eq(new.external_id.as_str()))
        .filter(associations::Column::IsActive.eq(false))
        .exec(conn)
        .await?;

    if reclaimed.rows_affected > 0 {
        ldebug!(
            "system",
            LogStage::Db,
            LogComponent::AssociationStore,
            "reclaim",
            "reactivated historical association",
            provider = provider,
            user_id = new.user_id
        );
        return SeaOrmAssociationStore::find_any(conn, new.provider, &new.external_id)
            .await?
            .ok_or_else(|| AppError::internal("reclaimed association disappeared"));
    }

    let row = associations::ActiveModel {
        user_id: Set(new.user_id),
        provider: Set(provider.to_string()),
        external_id: Set(new.external_id.clone()),
        access_token: Set(new.metadata.access_token.clone()),
        avatar: Set(new.metadata.avatar.clone()),
        profile_url: Set(new.metadata.profile_url.clone()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    row.insert(conn).await.map_err(|err| duplicate_or_db(err, new))
}

fn duplicate_or_db(err: DbErr, new: &NewAssociation) -> AppError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::DuplicateIdentity {
            provider: new.provider,
            external_id: new.external_id.clone(),
        }
    } else {
        err.into()
    }
}

#[async_trait]
impl AssociationStore for SeaOrmAssociationStore {
    async fn find_by_identity(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<Association>> {
        Ok(Self::find_any(&self.db, provider, external_id)
            .await?
            .filter(|row| row.is_active))
    }

    async fn find_for_user(
        &self,
        user_id: i32,
        provider: ProviderKind,
    ) -> Result<Option<Association>> {
        Ok(associations::Entity::find()
            .filter(associations::Column::UserId.eq(user_id))
            .filter(associations::Column::Provider.eq(provider.as_str()))
            .filter(associations::Column::IsActive.eq(true))
            .one(&self.db)
            .await?)
    }

    async fn history_for_user(
        &self,
        user_id: i32,
        provider: ProviderKind,
    ) -> Result<Vec<Association>> {
        Ok(associations::Entity::find()
            .filter(associations::Column::UserId.eq(user_id))
            .filter(associations::Column::Provider.eq(provider.as_str()))
            .order_by_desc(associations::Column::UpdatedAt)
            .all(&self.db)
            .await?)
    }

    async fn create(&self, new: NewAssociation) -> Result<Association> {
        let txn = self.db.begin().await?;

        match claim_association(&txn, &new).await {
            Ok(row) => {
                txn.commit().await?;
                linfo!(
                    "system",
                    LogStage::Db,
                    LogComponent::AssociationStore,
                    "create",
                    "association linked",
                    provider = new.provider.as_str(),
                    user_id = new.user_id,
                    association_id = row.id
                );
                Ok(row)
            }
            Err(AppError::DuplicateIdentity { provider, external_id }) => {
                txn.rollback().await?;
                match Self::find_any(&self.db, provider, &external_id).await? {
                    Some(existing) if existing.is_active && existing.user_id == new.user_id => {
                        Ok(existing)
                    }
                    _ => {
                        lwarn!(
                            "system",
                            LogStage::Db,
                            LogComponent::AssociationStore,
                            "create",
                            "identity already linked to another user",
                            provider = provider.as_str(),
                            user_id = new.user_id
                        );
                        Err(AppError::DuplicateIdentity { provider, external_id })
                    }
                }
            }
            Err(other) => {
                txn.rollback().await?;
                Err(other)
            }
        }
    }

    async fn deactivate(&self, user_id: i32, provider: ProviderKind) -> Result<bool> {
        let result = associations::Entity::update_many()
            .col_expr(associations::Column::IsActive, Expr::value(false))
            .col_expr(associations::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(associations::Column::UserId.eq(user_id))
            .filter(associations::Column::Provider.eq(provider.as_str()))
            .filter(associations::Column::IsActive.eq(true))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(format!(
                "no active {provider} association for user {user_id}"
            )));
        }

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::AssociationStore,
            "deactivate",
            "association deactivated",
            provider = provider.as_str(),
            user_id = user_id
        );
        Ok(true)
    }

    async fn update_metadata(
        &self,
        association: &Association,
        metadata: AssociationMetadata,
    ) -> Result<Association> {
        let mut row = association.clone().into_active_model();
        row.access_token = Set(metadata.access_token);
        row.avatar = Set(metadata.avatar);
        row.profile_url = Set(metadata.profile_url);
        row.updated_at = Set(Utc::now().naive_utc());

        Ok(row.update(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{UserFixture, create_test_db};
    use pretty_assertions::assert_eq;
    use sea_orm::PaginatorTrait;

    fn new_link(user_id: i32, provider: ProviderKind, external_id: &str) -> NewAssociation {
        NewAssociation {
            user_id,
            provider,
            external_id: external_id.to_string(),
            metadata: AssociationMetadata {
                access_token: Some(format!("token-{external_id}")),
                avatar: Some("https://img.example.com/a.png".to_string()),
                profile_url: None,
            },
        }
    }

    async fn row_count(db: &DatabaseConnection) -> u64 {
        associations::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = create_test_db().await.unwrap();
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());

        let created = store
            .create(new_link(bob.id, ProviderKind::Facebook, "555"))
            .await
            .unwrap();
        assert!(created.is_active);
        assert_eq!(created.provider, "facebook");

        let found = store
            .find_by_identity(ProviderKind::Facebook, "555")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(
            store.find_for_user(bob.id, ProviderKind::Facebook).await.unwrap().map(|a| a.id),
            Some(created.id)
        );
        assert!(store.find_by_identity(ProviderKind::Twitter, "555").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_for_other_user_is_duplicate() {
        let db = create_test_db().await.unwrap();
        let alice = UserFixture::new().username("alice").insert(&db).await;
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());

        store.create(new_link(alice.id, ProviderKind::Twitter, "42")).await.unwrap();
        let err = store
            .create(new_link(bob.id, ProviderKind::Twitter, "42"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateIdentity { .. }));
        assert_eq!(row_count(&db).await, 1);
        let owner = store.find_by_identity(ProviderKind::Twitter, "42").await.unwrap().unwrap();
        assert_eq!(owner.user_id, alice.id);
    }

    #[tokio::test]
    async fn test_create_same_user_twice_returns_existing() {
        let db = create_test_db().await.unwrap();
        let alice = UserFixture::new().username("alice").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());

        let first = store.create(new_link(alice.id, ProviderKind::Twitter, "42")).await.unwrap();
        let second = store.create(new_link(alice.id, ProviderKind::Twitter, "42")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_deactivate_then_relink_reuses_row() {
        let db = create_test_db().await.unwrap();
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());

        let created = store.create(new_link(bob.id, ProviderKind::Facebook, "555")).await.unwrap();
        assert!(store.deactivate(bob.id, ProviderKind::Facebook).await.unwrap());
        assert!(store.find_by_identity(ProviderKind::Facebook, "555").await.unwrap().is_none());

        let err = store.deactivate(bob.id, ProviderKind::Facebook).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let relinked = store.create(new_link(bob.id, ProviderKind::Facebook, "555")).await.unwrap();
        assert_eq!(relinked.id, created.id);
        assert!(relinked.is_active);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_inactive_identity_can_move_to_new_owner() {
        let db = create_test_db().await.unwrap();
        let alice = UserFixture::new().username("alice").insert(&db).await;
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());

        store.create(new_link(alice.id, ProviderKind::Facebook, "555")).await.unwrap();
        store.deactivate(alice.id, ProviderKind::Facebook).await.unwrap();

        let moved = store.create(new_link(bob.id, ProviderKind::Facebook, "555")).await.unwrap();
        assert_eq!(moved.user_id, bob.id);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_linking_second_identity_deactivates_first() {
        let db = create_test_db().await.unwrap();
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());

        store.create(new_link(bob.id, ProviderKind::Twitter, "1")).await.unwrap();
        let second = store.create(new_link(bob.id, ProviderKind::Twitter, "2")).await.unwrap();

        let active = store.find_for_user(bob.id, ProviderKind::Twitter).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        let history = store.history_for_user(bob.id, ProviderKind::Twitter).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|a| a.is_active).count(), 1);
    }

    #[tokio::test]
    async fn test_update_metadata_refreshes_volatile_fields() {
        let db = create_test_db().await.unwrap();
        let bob = UserFixture::new().username("bob").insert(&db).await;
        let store = SeaOrmAssociationStore::new(db.clone());
        let created = store.create(new_link(bob.id, ProviderKind::Twitter, "7")).await.unwrap();

        let updated = store
            .update_metadata(
                &created,
                AssociationMetadata {
                    access_token: Some("rotated".into()),
                    avatar: None,
                    profile_url: Some("https://twitter.com/bob".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.access_token.as_deref(), Some("rotated"));
        assert_eq!(updated.avatar, None);
        assert_eq!(updated.profile_url.as_deref(), Some("https://twitter.com/bob"));
        assert_eq!(updated.external_id, "7");
    }
}
