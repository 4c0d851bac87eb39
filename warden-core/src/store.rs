pub mod memory;

use std::collections::HashSet;

use crate::model::{
    ApiEndpoint, ApiOperation, EndpointId, OperationId, PermissionTuple, TenantId, TenantModule,
    User, UserId,
};

/// Errors surfaced by policy-store implementations.
#[derive(Debug)]
pub enum StoreError {
    /// A referenced row does not exist (admin writes only; reads
    /// report absence through `Option`).
    NotFound(String),
    /// A uniqueness constraint or reconciliation conflict.
    Conflict(String),
    /// The underlying storage backend failed.
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl StoreError {
    /// Construct a `Database` variant from any driver error type.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Database(Box::new(err))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "Not found: {msg}"),
            StoreError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            StoreError::Database(err) => write!(f, "Database error: {err}"),
            StoreError::Other(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Read contract of the persisted RBAC policy.
///
/// Every query is tenant-scoped at source: implementations never
/// return rows belonging to another tenant, soft-deleted roles are
/// excluded, and `allowed = false` grants are filtered before the
/// tuple set is built. All methods are pure reads; results are
/// snapshot-consistent within one call but not across calls.
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Exact lookup of an endpoint by its canonical path.
    async fn endpoint_by_path(&self, path: &str) -> Result<Option<ApiEndpoint>, StoreError>;

    /// Every registered endpoint, for parameterized-pattern matching.
    async fn endpoints(&self) -> Result<Vec<ApiEndpoint>, StoreError>;

    /// The operation registered for `(endpoint, method)`, if any.
    async fn operation(
        &self,
        endpoint: EndpointId,
        method: &str,
    ) -> Result<Option<ApiOperation>, StoreError>;

    /// The tenant's subscription row for exactly `(module, submodule)`;
    /// `submodule = None` matches only module-level subscriptions.
    async fn tenant_module(
        &self,
        tenant: TenantId,
        module: &str,
        submodule: Option<&str>,
    ) -> Result<Option<TenantModule>, StoreError>;

    /// Whether the tenant has explicitly disabled this operation.
    async fn tenant_override_disabled(
        &self,
        tenant: TenantId,
        operation: OperationId,
    ) -> Result<bool, StoreError>;

    /// Whether a hard per-user block exists for this operation.
    async fn user_blocked(
        &self,
        tenant: TenantId,
        user: UserId,
        operation: OperationId,
    ) -> Result<bool, StoreError>;

    /// The denormalized set of `(module, submodule?, action)` tuples
    /// the user currently holds through any non-deleted role,
    /// restricted to `allowed = true` grants.
    async fn permission_tuples(
        &self,
        tenant: TenantId,
        user: UserId,
    ) -> Result<HashSet<PermissionTuple>, StoreError>;

    async fn user_by_id(&self, user: UserId) -> Result<Option<User>, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}
