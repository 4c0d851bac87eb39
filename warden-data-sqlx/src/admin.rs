//! Administrative writes for the policy store.
//!
//! Everything here runs out of band of the request hot path. Writes
//! that span more than one statement are transactional so the catalog
//! is never observed half-updated. Create operations follow
//! get-or-create semantics keyed on the schema's uniqueness
//! constraints, which makes seeding idempotent.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use warden_core::{
    OperationId, PermissionId, RoleId, StoreError, TenantId, TenantModuleId, UserId,
};

/// The base action vocabulary every deployment starts from.
pub const BASE_ACTIONS: [(&str, &str); 5] = [
    ("view", "Read data"),
    ("create", "Create new record"),
    ("update", "Full or partial update"),
    ("delete", "Delete record"),
    ("approve", "Approve record"),
];

#[derive(Clone)]
pub struct PolicyAdmin {
    pool: SqlitePool,
}

impl PolicyAdmin {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Seed the action vocabulary and the sentinel module that owns
    /// unclaimed routes.
    pub async fn seed_base(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        for (code, description) in BASE_ACTIONS {
            sqlx::query("INSERT INTO actions (code, description) VALUES (?, ?) ON CONFLICT(code) DO NOTHING")
                .bind(code)
                .bind(description)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::database)?;
        }
        sqlx::query("INSERT INTO modules (code, name) VALUES (?, ?) ON CONFLICT(code) DO NOTHING")
            .bind(warden_core::SYSTEM_MODULE)
            .bind("System")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        tx.commit().await.map_err(StoreError::database)
    }

    pub async fn create_tenant(&self, name: &str) -> Result<TenantId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        sqlx::query("INSERT INTO tenants (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        let id: i64 = sqlx::query_scalar("SELECT id FROM tenants WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        tx.commit().await.map_err(StoreError::database)?;
        Ok(TenantId::new(id))
    }

    pub async fn upsert_module(&self, code: &str, name: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO modules (code, name) VALUES (?, ?)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name",
        )
        .bind(code)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn upsert_submodule(&self, code: &str, name: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO submodules (code, name) VALUES (?, ?)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name",
        )
        .bind(code)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn map_submodule(&self, module: &str, submodule: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO module_submodules (module_code, submodule_code) VALUES (?, ?)
             ON CONFLICT DO NOTHING",
        )
        .bind(module)
        .bind(submodule)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn upsert_action(&self, code: &str, description: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO actions (code, description) VALUES (?, ?)
             ON CONFLICT(code) DO UPDATE SET description = excluded.description",
        )
        .bind(code)
        .bind(description)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    /// Subscribe a tenant to `(module, submodule?)`, returning the
    /// existing edge when one is already present.
    pub async fn subscribe(
        &self,
        tenant: TenantId,
        module: &str,
        submodule: Option<&str>,
    ) -> Result<TenantModuleId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        sqlx::query(
            "INSERT INTO tenant_modules (tenant_id, module_code, submodule_code)
             VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(tenant.get())
        .bind(module)
        .bind(submodule)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;
        let id: i64 = sqlx::query_scalar(
            "SELECT id FROM tenant_modules
             WHERE tenant_id = ? AND module_code = ?
               AND IFNULL(submodule_code, '') = IFNULL(?, '')",
        )
        .bind(tenant.get())
        .bind(module)
        .bind(submodule)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::database)?;
        tx.commit().await.map_err(StoreError::database)?;
        Ok(TenantModuleId::new(id))
    }

    pub async fn set_subscription_enabled(
        &self,
        subscription: TenantModuleId,
        enabled: bool,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE tenant_modules SET is_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(subscription.get())
            .execute(&self.pool)
            .await
            .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn set_subscription_expiration(
        &self,
        subscription: TenantModuleId,
        expires: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE tenant_modules SET expiration_date = ? WHERE id = ?")
            .bind(expires)
            .bind(subscription.get())
            .execute(&self.pool)
            .await
            .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn define_permission(
        &self,
        tenant: TenantId,
        subscription: TenantModuleId,
        action: &str,
    ) -> Result<PermissionId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        sqlx::query(
            "INSERT INTO permissions (tenant_id, tenant_module_id, action_code)
             VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(tenant.get())
        .bind(subscription.get())
        .bind(action)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;
        let id: i64 = sqlx::query_scalar(
            "SELECT id FROM permissions
             WHERE tenant_id = ? AND tenant_module_id = ? AND action_code = ?",
        )
        .bind(tenant.get())
        .bind(subscription.get())
        .bind(action)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::database)?;
        tx.commit().await.map_err(StoreError::database)?;
        Ok(PermissionId::new(id))
    }

    pub async fn create_role(&self, tenant: TenantId, name: &str) -> Result<RoleId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        sqlx::query(
            "INSERT INTO roles (tenant_id, name) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(tenant.get())
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;
        let id: i64 = sqlx::query_scalar("SELECT id FROM roles WHERE tenant_id = ? AND name = ?")
            .bind(tenant.get())
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        tx.commit().await.map_err(StoreError::database)?;
        Ok(RoleId::new(id))
    }

    /// Soft-delete: the role row stays for audit, its grants stop
    /// resolving immediately.
    pub async fn soft_delete_role(&self, role: RoleId) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE roles SET is_deleted = 1, deleted_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(role.get())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn grant(
        &self,
        role: RoleId,
        permission: PermissionId,
        allowed: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id, allowed) VALUES (?, ?, ?)
             ON CONFLICT(role_id, permission_id) DO UPDATE SET allowed = excluded.allowed",
        )
        .bind(role.get())
        .bind(permission.get())
        .bind(allowed)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        tenant: Option<TenantId>,
        username: &str,
    ) -> Result<UserId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;
        sqlx::query(
            "INSERT INTO users (tenant_id, username) VALUES (?, ?) ON CONFLICT(username) DO NOTHING",
        )
        .bind(tenant.map(TenantId::get))
        .bind(username)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;
        let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        tx.commit().await.map_err(StoreError::database)?;
        Ok(UserId::new(id))
    }

    pub async fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(user.get())
        .bind(role.get())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn set_operation_enabled(
        &self,
        operation: OperationId,
        enabled: bool,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE api_operations SET is_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(operation.get())
            .execute(&self.pool)
            .await
            .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn set_override(
        &self,
        tenant: TenantId,
        operation: OperationId,
        enabled: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tenant_api_overrides (tenant_id, operation_id, is_enabled)
             VALUES (?, ?, ?)
             ON CONFLICT(tenant_id, operation_id) DO UPDATE SET is_enabled = excluded.is_enabled",
        )
        .bind(tenant.get())
        .bind(operation.get())
        .bind(enabled)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn block_user(
        &self,
        tenant: TenantId,
        user: UserId,
        operation: OperationId,
        reason: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_api_blocks (tenant_id, user_id, operation_id, reason)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(tenant_id, user_id, operation_id) DO UPDATE SET reason = excluded.reason",
        )
        .bind(tenant.get())
        .bind(user.get())
        .bind(operation.get())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }

    pub async fn unblock_user(
        &self,
        tenant: TenantId,
        user: UserId,
        operation: OperationId,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "DELETE FROM user_api_blocks
             WHERE tenant_id = ? AND user_id = ? AND operation_id = ?",
        )
        .bind(tenant.get())
        .bind(user.get())
        .bind(operation.get())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;
        Ok(())
    }
}
