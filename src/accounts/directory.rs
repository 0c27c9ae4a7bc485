use chrono::Utc;
use entity::users::{self, UNUSABLE_PASSWORD_PREFIX};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};

use super::User;
use crate::error::{AppError, Result};
use crate::registration::ValidationErrors;
use crate::{linfo, lwarn, logging::{LogComponent, LogStage}};

/// Password hash that can never verify.
#[must_use]
pub fn unusable_password() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    format!("{UNUSABLE_PASSWORD_PREFIX}{suffix}")
}

/// Insert a provider-only user on `conn`, usually a transaction.
pub async fn insert_external_user<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    email: &str,
) -> Result<User> {
    let now = Utc::now().naive_utc();
    let row = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(unusable_password()),
        is_active: Set(true),
        last_login: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    row.insert(conn).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            let mut errors = ValidationErrors::default();
            if detail.contains("email") {
                errors.add("email", "This email address is already in use.");
            } else {
                errors.add("username", "This username is already in use.");
            }
            errors.into()
        }
        _ => err.into(),
    })
}

/// Read side of the user table plus password login.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    db: DatabaseConnection,
}

impl UserDirectory {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        Ok(users::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Case-insensitive username lookup.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(users::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(users::Column::Username))).eq(username.to_lowercase()))
            .one(&self.db)
            .await?)
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(users::Column::Username))).eq(username.to_lowercase()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(users::Column::Email))).eq(email.to_lowercase()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Verify a local password. Provider-only accounts never pass.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.find_by_username(username).await? else {
            return Err(AppError::InvalidCredentials);
        };
        if !user.has_usable_password() {
            return Err(AppError::InvalidCredentials);
        }

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::internal_with_source("password check panicked", e))??;

        if !verified {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Accounts,
                "authenticate",
                "password rejected",
                user_id = user.id
            );
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::inactive_account(format!("user {} is disabled", user.username)));
        }

        Ok(user)
    }

    /// Stamp `last_login`.
    pub async fn record_login(&self, user: &User) -> Result<()> {
        let now = Utc::now().naive_utc();
        users::Entity::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(Some(now)))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .exec(&self.db)
            .await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Accounts,
            "login",
            "user logged in",
            user_id = user.id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{UserFixture, create_test_db};

    #[test]
    fn test_unusable_password_is_marked() {
        let hash = unusable_password();
        assert!(hash.starts_with(UNUSABLE_PASSWORD_PREFIX));
        assert_ne!(hash, unusable_password());
    }

    #[tokio::test]
    async fn test_case_insensitive_lookups() {
        let db = create_test_db().await.unwrap();
        UserFixture::new().username("Alice").email("Alice@Example.com").insert(&db).await;
        let directory = UserDirectory::new(db);

        assert!(directory.username_taken("alice").await.unwrap());
        assert!(directory.username_taken("ALICE").await.unwrap());
        assert!(!directory.username_taken("bob").await.unwrap());
        assert!(directory.email_taken("alice@example.com").await.unwrap());
        assert_eq!(
            directory.find_by_username("aLiCe").await.unwrap().unwrap().username,
            "Alice"
        );
    }

    #[tokio::test]
    async fn test_password_login_rules() {
        let db = create_test_db().await.unwrap();
        UserFixture::new().username("carol").password("hunter2").insert(&db).await;
        UserFixture::new().username("dave").insert(&db).await;
        UserFixture::new().username("erin").password("pw").inactive().insert(&db).await;
        let directory = UserDirectory::new(db);

        let carol = directory.authenticate("carol", "hunter2").await.unwrap();
        assert_eq!(carol.username, "carol");
        assert!(matches!(
            directory.authenticate("carol", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        // provider-only account
        assert!(matches!(
            directory.authenticate("dave", "!").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            directory.authenticate("erin", "pw").await,
            Err(AppError::InactiveAccount { .. })
        ));
        assert!(matches!(
            directory.authenticate("nobody", "pw").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_insert_external_user_duplicate_username() {
        let db = create_test_db().await.unwrap();
        let user = insert_external_user(&db, "frank", "frank@example.com").await.unwrap();
        assert!(!user.has_usable_password());

        let err = insert_external_user(&db, "FRANK", "other@example.com").await.unwrap_err();
        let AppError::Validation { errors } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.field("username"), ["This username is already in use."]);
        assert!(errors.field("email").is_empty());

        let directory = UserDirectory::new(db.clone());
        directory.record_login(&user).await.unwrap();
        let count = users::Entity::find()
            .filter(users::Column::LastLogin.is_not_null())
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_insert_external_user_duplicate_email() {
        let db = create_test_db().await.unwrap();
        insert_external_user(&db, "one", "x@example.com").await.unwrap();

        let err = insert_external_user(&db, "two", "X@Example.com").await.unwrap_err();
        let AppError::Validation { errors } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.field("email"), ["This email address is already in use."]);
        assert!(errors.field("username").is_empty());
        assert_eq!(users::Entity::find().count(&db).await.unwrap(), 1);
    }
}
