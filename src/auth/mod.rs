use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::database::schema::types::UserRole;
use crate::models::User;

pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::AuthenticatedUser;
pub use session::SessionManager;

/// The signed-in caller, attached to the request by the session middleware.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}
