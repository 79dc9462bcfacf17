//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::{
    auth::{AuthServiceError, JwtCodec},
    database::Db,
    domain::users::{records::UserRecord, repository::PgUsersRepository},
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    db: Db,
    codec: JwtCodec,
    users_repository: PgUsersRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(db: Db, codec: JwtCodec) -> Self {
        Self {
            db,
            codec,
            users_repository: PgUsersRepository::new(),
        }
    }

    /// Issue a bearer token for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be signed.
    pub fn issue_token(&self, user: &UserRecord) -> Result<String, AuthServiceError> {
        let token = self.codec.issue(user.uuid, Timestamp::now())?;

        tracing::info!(user_uuid = %user.uuid, ttl = ?self.codec.ttl(), "issued bearer token");

        Ok(token)
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(
        &self,
        bearer_token: &str,
    ) -> Result<UserRecord, AuthServiceError> {
        let claims = self.codec.verify(bearer_token)?;

        let mut tx = self.db.begin_transaction().await?;

        let user = self
            .users_repository
            .get_user(&mut tx, claims.user_uuid())
            .await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the user it was issued for.
    async fn authenticate_bearer(&self, bearer_token: &str)
    -> Result<UserRecord, AuthServiceError>;
}
