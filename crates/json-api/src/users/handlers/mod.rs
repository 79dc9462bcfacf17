//! User Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::users::records::UserRecord;

pub(crate) mod index;
pub(crate) mod me;
pub(crate) mod role;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    /// customer or admin
    pub role: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            uuid: user.uuid.into(),
            is_admin: user.actor().is_admin(),
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at.to_string(),
        }
    }
}

/// Single User Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

impl From<UserRecord> for UserEnvelope {
    fn from(user: UserRecord) -> Self {
        Self {
            success: true,
            user: user.into(),
        }
    }
}
