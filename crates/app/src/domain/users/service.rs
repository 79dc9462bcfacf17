//! Users service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::users::{
        data::NewUser,
        errors::UsersServiceError,
        records::{Role, UserRecord, UserUuid},
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = self.repository.get_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let users = self.repository.list_users(&mut tx).await?;

        tx.commit().await?;

        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        if user.email.trim().is_empty() || user.name.trim().is_empty() {
            return Err(UsersServiceError::MissingRequiredData);
        }

        if !user.email.contains('@') {
            return Err(UsersServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_user(&mut tx, &user).await?;

        tx.commit().await?;

        tracing::info!(user_uuid = %created.uuid, role = %created.role, "created user");

        Ok(created)
    }

    async fn set_role(&self, user: UserUuid, role: Role) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let updated = self.repository.update_role(&mut tx, user, role).await?;

        tx.commit().await?;

        tracing::info!(user_uuid = %updated.uuid, role = %updated.role, "changed user role");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Retrieve a single user.
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError>;

    /// Retrieve every user, newest first.
    async fn list_users(&self) -> Result<Vec<UserRecord>, UsersServiceError>;

    /// Register a user. Emails are stored lower-cased and must be unique.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;

    /// Grant or revoke the admin role.
    async fn set_role(&self, user: UserUuid, role: Role) -> Result<UserRecord, UsersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            uuid: UserUuid::new(),
            email: email.to_string(),
            name: "Nami".to_string(),
            role: Role::Customer,
        }
    }

    #[tokio::test]
    async fn create_user_lowercases_email() -> TestResult {
        let ctx = TestContext::new().await;

        let user = ctx
            .users
            .create_user(new_user("Nami@Example.com"))
            .await?;

        assert_eq!(user.email, "nami@example.com");
        assert_eq!(user.role, Role::Customer);

        Ok(())
    }

    #[tokio::test]
    async fn create_user_duplicate_email_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.users.create_user(new_user("zoro@example.com")).await?;

        let result = ctx.users.create_user(new_user("ZORO@example.com")).await;

        assert!(
            matches!(result, Err(UsersServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_user_without_name_is_rejected() {
        let ctx = TestContext::new().await;

        let mut user = new_user("usopp@example.com");
        user.name = "  ".to_string();

        let result = ctx.users.create_user(user).await;

        assert!(
            matches!(result, Err(UsersServiceError::MissingRequiredData)),
            "expected MissingRequiredData, got {result:?}"
        );
    }

    #[tokio::test]
    async fn set_role_promotes_user() -> TestResult {
        let ctx = TestContext::new().await;

        let user = ctx.users.create_user(new_user("robin@example.com")).await?;

        let promoted = ctx.users.set_role(user.uuid, Role::Admin).await?;
        let fetched = ctx.users.get_user(user.uuid).await?;

        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(fetched.role, Role::Admin);

        Ok(())
    }

    #[tokio::test]
    async fn get_user_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.users.get_user(UserUuid::new()).await;

        assert!(
            matches!(result, Err(UsersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_users_includes_created_users() -> TestResult {
        let ctx = TestContext::new().await;

        let a = ctx.users.create_user(new_user("a@example.com")).await?;
        let b = ctx.users.create_user(new_user("b@example.com")).await?;

        let uuids: Vec<UserUuid> = ctx
            .users
            .list_users()
            .await?
            .iter()
            .map(|user| user.uuid)
            .collect();

        assert!(uuids.contains(&a.uuid), "user A should be listed");
        assert!(uuids.contains(&b.uuid), "user B should be listed");

        Ok(())
    }
}
