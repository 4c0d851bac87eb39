use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw row identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(
    /// Identifier of an isolated customer workspace.
    TenantId
);
define_id!(
    /// Identifier of an authenticated principal.
    UserId
);
define_id!(
    /// Identifier of a tenant-scoped role.
    RoleId
);
define_id!(
    /// Identifier of a registered API endpoint (a path template).
    EndpointId
);
define_id!(
    /// Identifier of an `(endpoint, http_method)` operation.
    OperationId
);
define_id!(
    /// Identifier of a tenant's module subscription edge.
    TenantModuleId
);
define_id!(
    /// Identifier of a grantable `(tenant, tenant_module, action)` unit.
    PermissionId
);

/// An isolated customer workspace. Names are unique across the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub is_active: bool,
}

/// Coarse functional area (e.g. `CRM`), identified by a stable short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub code: String,
    pub name: String,
}

/// Finer area within a module (e.g. `LEADS`). A submodule may be shared
/// by several modules through the module/submodule mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubModule {
    pub code: String,
    pub name: String,
}

/// Verb token in the permission vocabulary (`view`, `create`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub code: String,
    pub description: String,
}

/// Subscription edge: a tenant has (optionally time-bounded) access to
/// a `(module, submodule?)`.
///
/// `submodule_code = None` is its own subscription key, distinct from
/// every submodule-specific row of the same module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantModule {
    pub id: TenantModuleId,
    pub tenant_id: TenantId,
    pub module_code: String,
    pub submodule_code: Option<String>,
    pub is_enabled: bool,
    pub expiration_date: Option<NaiveDate>,
}

impl TenantModule {
    /// A subscription is expired only strictly after its expiration
    /// date; `expiration_date == today` still passes.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|exp| exp < today)
    }
}

/// Grantable unit scoped to a tenant subscription:
/// `(tenant, tenant_module, action)`, unique on the triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub tenant_id: TenantId,
    pub tenant_module_id: TenantModuleId,
    pub action_code: String,
}

/// Named bundle of permissions, scoped to a tenant and soft-deletable.
/// Soft-deleted roles are excluded from permission resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The identified principal. `tenant_id` is `None` only for platform
/// operators; every regular user belongs to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub username: String,
    pub is_active: bool,
}

/// Registered API endpoint: a canonical path template owned by a
/// `(module, submodule?)`. Paths are unique and stored in the
/// canonical form produced by [`crate::normalize::normalize_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub id: EndpointId,
    pub path: String,
    pub module_code: String,
    pub submodule_code: Option<String>,
}

impl ApiEndpoint {
    /// Human form of the owning scope: `CRM/LEADS`, or just `CRM` for
    /// module-level endpoints.
    pub fn scope(&self) -> String {
        match &self.submodule_code {
            Some(sub) => format!("{}/{}", self.module_code, sub),
            None => self.module_code.clone(),
        }
    }
}

/// `(endpoint, http_method)` with the action a caller must hold to
/// invoke it. When `action_code` is absent the HTTP-method default
/// applies (see [`default_action`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOperation {
    pub id: OperationId,
    pub endpoint_id: EndpointId,
    pub http_method: String,
    pub action_code: Option<String>,
    pub is_enabled: bool,
}

/// Denormalized permission tuple `(module, submodule?, action)` as
/// resolved from a user's non-deleted roles.
pub type PermissionTuple = (String, Option<String>, String);

/// The principal facts the decision engine evaluates against: who is
/// asking, and on behalf of which tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub username: String,
}

impl Subject {
    pub fn new(user_id: UserId, tenant_id: Option<TenantId>, username: impl Into<String>) -> Self {
        Self {
            user_id,
            tenant_id,
            username: username.into(),
        }
    }
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.tenant_id, user.username.clone())
    }
}

/// Default action required for an HTTP method when an operation does
/// not declare an explicit `action_code`.
///
/// Any method outside this table requires an explicit action, else the
/// decision engine denies with `unknown_action_mapping`.
pub fn default_action(method: &str) -> Option<&'static str> {
    match method {
        "GET" => Some("view"),
        "POST" => Some("create"),
        "PUT" | "PATCH" => Some("update"),
        "DELETE" => Some("delete"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_defaults_cover_crud_verbs() {
        assert_eq!(default_action("GET"), Some("view"));
        assert_eq!(default_action("POST"), Some("create"));
        assert_eq!(default_action("PUT"), Some("update"));
        assert_eq!(default_action("PATCH"), Some("update"));
        assert_eq!(default_action("DELETE"), Some("delete"));
        assert_eq!(default_action("OPTIONS"), None);
        assert_eq!(default_action("get"), None);
    }

    #[test]
    fn expiration_today_is_not_expired() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let tm = TenantModule {
            id: TenantModuleId::new(1),
            tenant_id: TenantId::new(1),
            module_code: "CRM".into(),
            submodule_code: None,
            is_enabled: true,
            expiration_date: Some(today),
        };
        assert!(!tm.is_expired(today));
        assert!(tm.is_expired(today.succ_opt().unwrap()));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = TenantId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }
}
