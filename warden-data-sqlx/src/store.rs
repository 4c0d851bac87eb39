use std::collections::HashSet;

use sqlx::SqlitePool;

use warden_core::{
    ApiEndpoint, ApiOperation, EndpointId, OperationId, PermissionTuple, PolicyStore, StoreError,
    TenantId, TenantModule, TenantModuleId, User, UserId,
};

/// SQLx-backed [`PolicyStore`].
///
/// Every query is tenant-scoped in SQL; the hot path reads rows
/// independently and never opens a transaction.
#[derive(Clone)]
pub struct SqlxPolicyStore {
    pool: SqlitePool,
}

impl SqlxPolicyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct EndpointRow {
    id: i64,
    path: String,
    module_code: String,
    submodule_code: Option<String>,
}

impl From<EndpointRow> for ApiEndpoint {
    fn from(row: EndpointRow) -> Self {
        ApiEndpoint {
            id: EndpointId::new(row.id),
            path: row.path,
            module_code: row.module_code,
            submodule_code: row.submodule_code,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OperationRow {
    id: i64,
    endpoint_id: i64,
    http_method: String,
    action_code: Option<String>,
    is_enabled: bool,
}

impl From<OperationRow> for ApiOperation {
    fn from(row: OperationRow) -> Self {
        ApiOperation {
            id: OperationId::new(row.id),
            endpoint_id: EndpointId::new(row.endpoint_id),
            http_method: row.http_method,
            action_code: row.action_code,
            is_enabled: row.is_enabled,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TenantModuleRow {
    id: i64,
    tenant_id: i64,
    module_code: String,
    submodule_code: Option<String>,
    is_enabled: bool,
    expiration_date: Option<chrono::NaiveDate>,
}

impl From<TenantModuleRow> for TenantModule {
    fn from(row: TenantModuleRow) -> Self {
        TenantModule {
            id: TenantModuleId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            module_code: row.module_code,
            submodule_code: row.submodule_code,
            is_enabled: row.is_enabled,
            expiration_date: row.expiration_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    tenant_id: Option<i64>,
    username: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            tenant_id: row.tenant_id.map(TenantId::new),
            username: row.username,
            is_active: row.is_active,
        }
    }
}

#[async_trait::async_trait]
impl PolicyStore for SqlxPolicyStore {
    async fn endpoint_by_path(&self, path: &str) -> Result<Option<ApiEndpoint>, StoreError> {
        let row: Option<EndpointRow> = sqlx::query_as(
            "SELECT id, path, module_code, submodule_code FROM api_endpoints WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(row.map(Into::into))
    }

    async fn endpoints(&self) -> Result<Vec<ApiEndpoint>, StoreError> {
        let rows: Vec<EndpointRow> = sqlx::query_as(
            "SELECT id, path, module_code, submodule_code FROM api_endpoints ORDER BY path",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn operation(
        &self,
        endpoint: EndpointId,
        method: &str,
    ) -> Result<Option<ApiOperation>, StoreError> {
        let row: Option<OperationRow> = sqlx::query_as(
            "SELECT id, endpoint_id, http_method, action_code, is_enabled
             FROM api_operations WHERE endpoint_id = ? AND http_method = ?",
        )
        .bind(endpoint.get())
        .bind(method)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(row.map(Into::into))
    }

    async fn tenant_module(
        &self,
        tenant: TenantId,
        module: &str,
        submodule: Option<&str>,
    ) -> Result<Option<TenantModule>, StoreError> {
        let row: Option<TenantModuleRow> = sqlx::query_as(
            "SELECT id, tenant_id, module_code, submodule_code, is_enabled, expiration_date
             FROM tenant_modules
             WHERE tenant_id = ? AND module_code = ?
               AND IFNULL(submodule_code, '') = IFNULL(?, '')",
        )
        .bind(tenant.get())
        .bind(module)
        .bind(submodule)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(row.map(Into::into))
    }

    async fn tenant_override_disabled(
        &self,
        tenant: TenantId,
        operation: OperationId,
    ) -> Result<bool, StoreError> {
        let disabled: i64 = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM tenant_api_overrides
                 WHERE tenant_id = ? AND operation_id = ? AND is_enabled = 0
             )",
        )
        .bind(tenant.get())
        .bind(operation.get())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(disabled != 0)
    }

    async fn user_blocked(
        &self,
        tenant: TenantId,
        user: UserId,
        operation: OperationId,
    ) -> Result<bool, StoreError> {
        let blocked: i64 = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM user_api_blocks
                 WHERE tenant_id = ? AND user_id = ? AND operation_id = ?
             )",
        )
        .bind(tenant.get())
        .bind(user.get())
        .bind(operation.get())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(blocked != 0)
    }

    async fn permission_tuples(
        &self,
        tenant: TenantId,
        user: UserId,
    ) -> Result<HashSet<PermissionTuple>, StoreError> {
        let rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT DISTINCT tm.module_code, tm.submodule_code, p.action_code
             FROM user_roles ur
             JOIN roles r
               ON r.id = ur.role_id AND r.is_deleted = 0 AND r.tenant_id = ?
             JOIN role_permissions rp
               ON rp.role_id = r.id AND rp.allowed = 1
             JOIN permissions p
               ON p.id = rp.permission_id AND p.tenant_id = ?
             JOIN tenant_modules tm
               ON tm.id = p.tenant_module_id
             WHERE ur.user_id = ?",
        )
        .bind(tenant.get())
        .bind(tenant.get())
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(rows.into_iter().collect())
    }

    async fn user_by_id(&self, user: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, tenant_id, username, is_active FROM users WHERE id = ?",
        )
        .bind(user.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(row.map(Into::into))
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, tenant_id, username, is_active FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(row.map(Into::into))
    }
}
