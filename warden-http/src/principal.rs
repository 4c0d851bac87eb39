use serde::{Deserialize, Serialize};

use warden_core::{Subject, TenantId, User, UserId};

/// The already-authenticated principal attached to a request.
///
/// Authentication itself happens upstream (JWT, session, gateway;
/// out of scope here); whatever layer performs it inserts a
/// `Principal` into the request extensions. Requests without one are
/// treated as anonymous and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub username: String,
}

impl Principal {
    pub fn new(user_id: UserId, tenant_id: Option<TenantId>, username: impl Into<String>) -> Self {
        Self {
            user_id,
            tenant_id,
            username: username.into(),
        }
    }

    /// The decision-engine view of this principal.
    pub fn subject(&self) -> Subject {
        Subject::new(self.user_id, self.tenant_id, self.username.clone())
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.tenant_id, user.username.clone())
    }
}
