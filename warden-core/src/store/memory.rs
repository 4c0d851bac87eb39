//! In-memory policy store, used by tests and demos.
//!
//! Mutators follow get-or-create semantics keyed on the same
//! uniqueness constraints the persistent schema enforces, so fixtures
//! can be assembled without error plumbing and re-registration is a
//! no-op.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};

use crate::model::{
    ApiEndpoint, ApiOperation, EndpointId, OperationId, Permission, PermissionId,
    PermissionTuple, Role, RoleId, Tenant, TenantId, TenantModule, TenantModuleId, User, UserId,
};
use crate::store::{PolicyStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    tenants: Vec<Tenant>,
    modules: HashMap<String, String>,
    submodules: HashMap<String, String>,
    module_submodules: HashSet<(String, String)>,
    actions: HashMap<String, String>,
    tenant_modules: Vec<TenantModule>,
    permissions: Vec<Permission>,
    roles: Vec<Role>,
    role_permissions: HashMap<(RoleId, PermissionId), bool>,
    users: Vec<User>,
    user_roles: HashSet<(UserId, RoleId)>,
    endpoints: Vec<ApiEndpoint>,
    operations: Vec<ApiOperation>,
    overrides: HashMap<(TenantId, OperationId), bool>,
    blocks: HashMap<(TenantId, UserId, OperationId), Option<String>>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Thread-safe in-memory [`PolicyStore`].
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    inner: RwLock<Inner>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Fixture builders (get-or-create) ────────────────────────────

    pub fn add_tenant(&self, name: &str) -> TenantId {
        let mut inner = self.write();
        if let Some(existing) = inner.tenants.iter().find(|t| t.name == name) {
            return existing.id;
        }
        let id = TenantId::new(inner.next_id());
        inner.tenants.push(Tenant {
            id,
            name: name.to_string(),
            is_active: true,
        });
        id
    }

    pub fn add_module(&self, code: &str, name: &str) {
        self.write()
            .modules
            .entry(code.to_string())
            .or_insert_with(|| name.to_string());
    }

    pub fn add_submodule(&self, code: &str, name: &str) {
        self.write()
            .submodules
            .entry(code.to_string())
            .or_insert_with(|| name.to_string());
    }

    pub fn map_submodule(&self, module: &str, submodule: &str) {
        self.write()
            .module_submodules
            .insert((module.to_string(), submodule.to_string()));
    }

    pub fn add_action(&self, code: &str, description: &str) {
        self.write()
            .actions
            .entry(code.to_string())
            .or_insert_with(|| description.to_string());
    }

    /// Subscribe a tenant to `(module, submodule?)`.
    pub fn subscribe(
        &self,
        tenant: TenantId,
        module: &str,
        submodule: Option<&str>,
    ) -> TenantModuleId {
        let mut inner = self.write();
        if let Some(existing) = inner.tenant_modules.iter().find(|tm| {
            tm.tenant_id == tenant
                && tm.module_code == module
                && tm.submodule_code.as_deref() == submodule
        }) {
            return existing.id;
        }
        let id = TenantModuleId::new(inner.next_id());
        inner.tenant_modules.push(TenantModule {
            id,
            tenant_id: tenant,
            module_code: module.to_string(),
            submodule_code: submodule.map(str::to_string),
            is_enabled: true,
            expiration_date: None,
        });
        id
    }

    pub fn set_subscription_enabled(&self, id: TenantModuleId, enabled: bool) {
        if let Some(tm) = self.write().tenant_modules.iter_mut().find(|tm| tm.id == id) {
            tm.is_enabled = enabled;
        }
    }

    pub fn set_subscription_expiration(&self, id: TenantModuleId, expires: Option<NaiveDate>) {
        if let Some(tm) = self.write().tenant_modules.iter_mut().find(|tm| tm.id == id) {
            tm.expiration_date = expires;
        }
    }

    pub fn define_permission(
        &self,
        tenant: TenantId,
        tenant_module: TenantModuleId,
        action: &str,
    ) -> PermissionId {
        let mut inner = self.write();
        if let Some(existing) = inner.permissions.iter().find(|p| {
            p.tenant_id == tenant
                && p.tenant_module_id == tenant_module
                && p.action_code == action
        }) {
            return existing.id;
        }
        let id = PermissionId::new(inner.next_id());
        inner.permissions.push(Permission {
            id,
            tenant_id: tenant,
            tenant_module_id: tenant_module,
            action_code: action.to_string(),
        });
        id
    }

    pub fn add_role(&self, tenant: TenantId, name: &str) -> RoleId {
        let mut inner = self.write();
        if let Some(existing) = inner
            .roles
            .iter()
            .find(|r| r.tenant_id == tenant && r.name == name)
        {
            return existing.id;
        }
        let id = RoleId::new(inner.next_id());
        inner.roles.push(Role {
            id,
            tenant_id: tenant,
            name: name.to_string(),
            is_deleted: false,
            deleted_at: None,
        });
        id
    }

    /// Soft-delete a role; its grants stop resolving immediately.
    pub fn delete_role(&self, role: RoleId) {
        if let Some(r) = self.write().roles.iter_mut().find(|r| r.id == role) {
            if !r.is_deleted {
                r.is_deleted = true;
                r.deleted_at = Some(Utc::now());
            }
        }
    }

    pub fn grant(&self, role: RoleId, permission: PermissionId, allowed: bool) {
        self.write().role_permissions.insert((role, permission), allowed);
    }

    pub fn add_user(&self, tenant: Option<TenantId>, username: &str) -> UserId {
        let mut inner = self.write();
        if let Some(existing) = inner.users.iter().find(|u| u.username == username) {
            return existing.id;
        }
        let id = UserId::new(inner.next_id());
        inner.users.push(User {
            id,
            tenant_id: tenant,
            username: username.to_string(),
            is_active: true,
        });
        id
    }

    pub fn assign_role(&self, user: UserId, role: RoleId) {
        self.write().user_roles.insert((user, role));
    }

    pub fn add_endpoint(
        &self,
        path: &str,
        module: &str,
        submodule: Option<&str>,
    ) -> EndpointId {
        let mut inner = self.write();
        if let Some(existing) = inner.endpoints.iter().find(|e| e.path == path) {
            return existing.id;
        }
        let id = EndpointId::new(inner.next_id());
        inner.endpoints.push(ApiEndpoint {
            id,
            path: path.to_string(),
            module_code: module.to_string(),
            submodule_code: submodule.map(str::to_string),
        });
        id
    }

    pub fn add_operation(
        &self,
        endpoint: EndpointId,
        method: &str,
        action: Option<&str>,
    ) -> OperationId {
        let mut inner = self.write();
        if let Some(existing) = inner
            .operations
            .iter()
            .find(|o| o.endpoint_id == endpoint && o.http_method == method)
        {
            return existing.id;
        }
        let id = OperationId::new(inner.next_id());
        inner.operations.push(ApiOperation {
            id,
            endpoint_id: endpoint,
            http_method: method.to_string(),
            action_code: action.map(str::to_string),
            is_enabled: true,
        });
        id
    }

    pub fn set_operation_enabled(&self, operation: OperationId, enabled: bool) {
        if let Some(op) = self
            .write()
            .operations
            .iter_mut()
            .find(|o| o.id == operation)
        {
            op.is_enabled = enabled;
        }
    }

    pub fn set_override(&self, tenant: TenantId, operation: OperationId, enabled: bool) {
        self.write().overrides.insert((tenant, operation), enabled);
    }

    pub fn block_user(
        &self,
        tenant: TenantId,
        user: UserId,
        operation: OperationId,
        reason: Option<&str>,
    ) {
        self.write()
            .blocks
            .insert((tenant, user, operation), reason.map(str::to_string));
    }
}

#[async_trait::async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn endpoint_by_path(&self, path: &str) -> Result<Option<ApiEndpoint>, StoreError> {
        Ok(self.read().endpoints.iter().find(|e| e.path == path).cloned())
    }

    async fn endpoints(&self) -> Result<Vec<ApiEndpoint>, StoreError> {
        Ok(self.read().endpoints.clone())
    }

    async fn operation(
        &self,
        endpoint: EndpointId,
        method: &str,
    ) -> Result<Option<ApiOperation>, StoreError> {
        Ok(self
            .read()
            .operations
            .iter()
            .find(|o| o.endpoint_id == endpoint && o.http_method == method)
            .cloned())
    }

    async fn tenant_module(
        &self,
        tenant: TenantId,
        module: &str,
        submodule: Option<&str>,
    ) -> Result<Option<TenantModule>, StoreError> {
        Ok(self
            .read()
            .tenant_modules
            .iter()
            .find(|tm| {
                tm.tenant_id == tenant
                    && tm.module_code == module
                    && tm.submodule_code.as_deref() == submodule
            })
            .cloned())
    }

    async fn tenant_override_disabled(
        &self,
        tenant: TenantId,
        operation: OperationId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .read()
            .overrides
            .get(&(tenant, operation))
            .is_some_and(|enabled| !enabled))
    }

    async fn user_blocked(
        &self,
        tenant: TenantId,
        user: UserId,
        operation: OperationId,
    ) -> Result<bool, StoreError> {
        Ok(self.read().blocks.contains_key(&(tenant, user, operation)))
    }

    async fn permission_tuples(
        &self,
        tenant: TenantId,
        user: UserId,
    ) -> Result<HashSet<PermissionTuple>, StoreError> {
        let inner = self.read();
        let mut tuples = HashSet::new();
        for (user_id, role_id) in &inner.user_roles {
            if *user_id != user {
                continue;
            }
            let Some(role) = inner
                .roles
                .iter()
                .find(|r| r.id == *role_id && !r.is_deleted && r.tenant_id == tenant)
            else {
                continue;
            };
            for ((rp_role, rp_perm), allowed) in &inner.role_permissions {
                if *rp_role != role.id || !allowed {
                    continue;
                }
                let Some(perm) = inner
                    .permissions
                    .iter()
                    .find(|p| p.id == *rp_perm && p.tenant_id == tenant)
                else {
                    continue;
                };
                if let Some(tm) = inner
                    .tenant_modules
                    .iter()
                    .find(|tm| tm.id == perm.tenant_module_id)
                {
                    tuples.insert((
                        tm.module_code.clone(),
                        tm.submodule_code.clone(),
                        perm.action_code.clone(),
                    ));
                }
            }
        }
        Ok(tuples)
    }

    async fn user_by_id(&self, user: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read().users.iter().find(|u| u.id == user).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builders_are_get_or_create() {
        let store = MemoryPolicyStore::new();
        let t1 = store.add_tenant("Acme");
        let t2 = store.add_tenant("Acme");
        assert_eq!(t1, t2);

        let ep1 = store.add_endpoint("/api/things", "CRM", None);
        let ep2 = store.add_endpoint("/api/things", "OPS", None);
        assert_eq!(ep1, ep2);
        // First registration wins; remapping is the synchronizer's job.
        let ep = store.endpoint_by_path("/api/things").await.unwrap().unwrap();
        assert_eq!(ep.module_code, "CRM");
    }

    #[tokio::test]
    async fn soft_deleted_roles_stop_resolving() {
        let store = MemoryPolicyStore::new();
        let tenant = store.add_tenant("Acme");
        let tm = store.subscribe(tenant, "CRM", Some("LEADS"));
        let perm = store.define_permission(tenant, tm, "view");
        let role = store.add_role(tenant, "Viewer");
        store.grant(role, perm, true);
        let user = store.add_user(Some(tenant), "alice");
        store.assign_role(user, role);

        let tuples = store.permission_tuples(tenant, user).await.unwrap();
        assert!(tuples.contains(&("CRM".into(), Some("LEADS".into()), "view".into())));

        store.delete_role(role);
        let tuples = store.permission_tuples(tenant, user).await.unwrap();
        assert!(tuples.is_empty());
    }

    #[tokio::test]
    async fn disallowed_grants_are_excluded() {
        let store = MemoryPolicyStore::new();
        let tenant = store.add_tenant("Acme");
        let tm = store.subscribe(tenant, "CRM", None);
        let perm = store.define_permission(tenant, tm, "delete");
        let role = store.add_role(tenant, "Limited");
        store.grant(role, perm, false);
        let user = store.add_user(Some(tenant), "bob");
        store.assign_role(user, role);

        let tuples = store.permission_tuples(tenant, user).await.unwrap();
        assert!(tuples.is_empty());
    }

    #[tokio::test]
    async fn tuples_are_tenant_scoped() {
        let store = MemoryPolicyStore::new();
        let acme = store.add_tenant("Acme");
        let globex = store.add_tenant("Globex");
        let tm = store.subscribe(acme, "CRM", None);
        let perm = store.define_permission(acme, tm, "view");
        let role = store.add_role(acme, "Viewer");
        store.grant(role, perm, true);
        let user = store.add_user(Some(acme), "alice");
        store.assign_role(user, role);

        assert!(!store.permission_tuples(acme, user).await.unwrap().is_empty());
        assert!(store.permission_tuples(globex, user).await.unwrap().is_empty());
    }
}
