//! Schema bootstrap for the policy store.
//!
//! The statements are idempotent (`IF NOT EXISTS`) so the bootstrap
//! can run on every startup. Uniqueness constraints mirror the policy
//! model invariants; note the expression index on `tenant_modules`,
//! which makes a `NULL` submodule its own subscription key instead of
//! the SQL default of infinitely-many distinct NULLs.

use sqlx::SqlitePool;

use warden_core::StoreError;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS tenants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS modules (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS submodules (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS module_submodules (
        module_code TEXT NOT NULL REFERENCES modules(code),
        submodule_code TEXT NOT NULL REFERENCES submodules(code),
        PRIMARY KEY (module_code, submodule_code)
    )",
    "CREATE TABLE IF NOT EXISTS actions (
        code TEXT PRIMARY KEY,
        description TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS tenant_modules (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id INTEGER NOT NULL REFERENCES tenants(id),
        module_code TEXT NOT NULL REFERENCES modules(code),
        submodule_code TEXT REFERENCES submodules(code),
        is_enabled INTEGER NOT NULL DEFAULT 1,
        expiration_date TEXT
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_tenant_modules
        ON tenant_modules (tenant_id, module_code, IFNULL(submodule_code, ''))",
    "CREATE TABLE IF NOT EXISTS permissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id INTEGER NOT NULL REFERENCES tenants(id),
        tenant_module_id INTEGER NOT NULL REFERENCES tenant_modules(id),
        action_code TEXT NOT NULL REFERENCES actions(code),
        UNIQUE (tenant_id, tenant_module_id, action_code)
    )",
    "CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id INTEGER NOT NULL REFERENCES tenants(id),
        name TEXT NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT,
        UNIQUE (tenant_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS role_permissions (
        role_id INTEGER NOT NULL REFERENCES roles(id),
        permission_id INTEGER NOT NULL REFERENCES permissions(id),
        allowed INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (role_id, permission_id)
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id INTEGER REFERENCES tenants(id),
        username TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS user_roles (
        user_id INTEGER NOT NULL REFERENCES users(id),
        role_id INTEGER NOT NULL REFERENCES roles(id),
        PRIMARY KEY (user_id, role_id)
    )",
    "CREATE TABLE IF NOT EXISTS api_endpoints (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL UNIQUE,
        module_code TEXT NOT NULL REFERENCES modules(code),
        submodule_code TEXT REFERENCES submodules(code)
    )",
    "CREATE TABLE IF NOT EXISTS api_operations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        endpoint_id INTEGER NOT NULL REFERENCES api_endpoints(id),
        http_method TEXT NOT NULL,
        action_code TEXT REFERENCES actions(code),
        is_enabled INTEGER NOT NULL DEFAULT 1,
        UNIQUE (endpoint_id, http_method)
    )",
    "CREATE TABLE IF NOT EXISTS tenant_api_overrides (
        tenant_id INTEGER NOT NULL REFERENCES tenants(id),
        operation_id INTEGER NOT NULL REFERENCES api_operations(id),
        is_enabled INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (tenant_id, operation_id)
    )",
    "CREATE TABLE IF NOT EXISTS user_api_blocks (
        tenant_id INTEGER NOT NULL REFERENCES tenants(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        operation_id INTEGER NOT NULL REFERENCES api_operations(id),
        reason TEXT,
        PRIMARY KEY (tenant_id, user_id, operation_id)
    )",
];

/// Create every policy table and index that does not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(StoreError::database)?;
    }
    Ok(())
}
