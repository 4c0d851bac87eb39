use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use warden_core::PolicyStore;
use warden_data_sqlx::{ensure_schema, PolicyAdmin, SqlxPolicyStore};

/// A single shared in-memory connection: pooled connections would
/// each see their own empty database.
async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn endpoint_and_operation_lookup() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    admin.upsert_module("CRM", "Customer Relationship Management").await.unwrap();

    sqlx::query("INSERT INTO api_endpoints (path, module_code) VALUES ('/api/enquiries', 'CRM')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO api_operations (endpoint_id, http_method, action_code)
         SELECT id, 'GET', 'view' FROM api_endpoints WHERE path = '/api/enquiries'",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = SqlxPolicyStore::new(pool);
    let endpoint = store.endpoint_by_path("/api/enquiries").await.unwrap().unwrap();
    assert_eq!(endpoint.module_code, "CRM");

    let operation = store.operation(endpoint.id, "GET").await.unwrap().unwrap();
    assert_eq!(operation.action_code.as_deref(), Some("view"));
    assert!(operation.is_enabled);

    assert!(store.operation(endpoint.id, "DELETE").await.unwrap().is_none());
    assert!(store.endpoint_by_path("/api/quotations").await.unwrap().is_none());
}

#[tokio::test]
async fn null_submodule_is_a_distinct_subscription_key() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    admin.upsert_module("CRM", "CRM").await.unwrap();
    admin.upsert_submodule("LEADS", "Leads").await.unwrap();
    admin.map_submodule("CRM", "LEADS").await.unwrap();

    let tenant = admin.create_tenant("Acme").await.unwrap();
    let module_level = admin.subscribe(tenant, "CRM", None).await.unwrap();
    let leads_level = admin.subscribe(tenant, "CRM", Some("LEADS")).await.unwrap();
    assert_ne!(module_level, leads_level);

    // Re-subscribing returns the same edge instead of duplicating it.
    assert_eq!(admin.subscribe(tenant, "CRM", None).await.unwrap(), module_level);

    let store = SqlxPolicyStore::new(pool);
    let found = store.tenant_module(tenant, "CRM", None).await.unwrap().unwrap();
    assert_eq!(found.id, module_level);
    let found = store
        .tenant_module(tenant, "CRM", Some("LEADS"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, leads_level);
    assert!(store
        .tenant_module(tenant, "CRM", Some("ORGS"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn permission_tuples_resolve_through_roles() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    admin.upsert_module("CRM", "CRM").await.unwrap();
    admin.upsert_submodule("LEADS", "Leads").await.unwrap();

    let tenant = admin.create_tenant("Acme").await.unwrap();
    let subscription = admin.subscribe(tenant, "CRM", Some("LEADS")).await.unwrap();
    let view = admin.define_permission(tenant, subscription, "view").await.unwrap();
    let create = admin.define_permission(tenant, subscription, "create").await.unwrap();

    let role = admin.create_role(tenant, "Viewer").await.unwrap();
    admin.grant(role, view, true).await.unwrap();
    admin.grant(role, create, false).await.unwrap();

    let user = admin.create_user(Some(tenant), "alice").await.unwrap();
    admin.assign_role(user, role).await.unwrap();

    let store = SqlxPolicyStore::new(pool);
    let tuples = store.permission_tuples(tenant, user).await.unwrap();
    assert!(tuples.contains(&("CRM".into(), Some("LEADS".into()), "view".into())));
    // allowed = false is a tombstone, not a grant.
    assert!(!tuples.contains(&("CRM".into(), Some("LEADS".into()), "create".into())));
}

#[tokio::test]
async fn soft_deleted_roles_are_excluded() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    admin.upsert_module("CRM", "CRM").await.unwrap();

    let tenant = admin.create_tenant("Acme").await.unwrap();
    let subscription = admin.subscribe(tenant, "CRM", None).await.unwrap();
    let view = admin.define_permission(tenant, subscription, "view").await.unwrap();
    let role = admin.create_role(tenant, "Viewer").await.unwrap();
    admin.grant(role, view, true).await.unwrap();
    let user = admin.create_user(Some(tenant), "alice").await.unwrap();
    admin.assign_role(user, role).await.unwrap();

    let store = SqlxPolicyStore::new(pool);
    assert!(!store.permission_tuples(tenant, user).await.unwrap().is_empty());

    admin.soft_delete_role(role).await.unwrap();
    assert!(store.permission_tuples(tenant, user).await.unwrap().is_empty());
}

#[tokio::test]
async fn queries_never_cross_tenants() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    admin.upsert_module("CRM", "CRM").await.unwrap();

    let acme = admin.create_tenant("Acme").await.unwrap();
    let globex = admin.create_tenant("Globex").await.unwrap();

    let subscription = admin.subscribe(acme, "CRM", None).await.unwrap();
    let view = admin.define_permission(acme, subscription, "view").await.unwrap();
    let role = admin.create_role(acme, "Viewer").await.unwrap();
    admin.grant(role, view, true).await.unwrap();
    let user = admin.create_user(Some(acme), "alice").await.unwrap();
    admin.assign_role(user, role).await.unwrap();

    let store = SqlxPolicyStore::new(pool);
    assert!(store.tenant_module(globex, "CRM", None).await.unwrap().is_none());
    assert!(store.permission_tuples(globex, user).await.unwrap().is_empty());
}

#[tokio::test]
async fn overrides_and_blocks_are_per_tenant_and_user() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    admin.upsert_module("CRM", "CRM").await.unwrap();

    let acme = admin.create_tenant("Acme").await.unwrap();
    let globex = admin.create_tenant("Globex").await.unwrap();
    let alice = admin.create_user(Some(acme), "alice").await.unwrap();
    let bob = admin.create_user(Some(acme), "bob").await.unwrap();

    sqlx::query("INSERT INTO api_endpoints (path, module_code) VALUES ('/api/enquiries', 'CRM')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO api_operations (endpoint_id, http_method)
         SELECT id, 'POST' FROM api_endpoints WHERE path = '/api/enquiries'",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = SqlxPolicyStore::new(pool);
    let endpoint = store.endpoint_by_path("/api/enquiries").await.unwrap().unwrap();
    let operation = store.operation(endpoint.id, "POST").await.unwrap().unwrap();

    admin.set_override(acme, operation.id, false).await.unwrap();
    assert!(store.tenant_override_disabled(acme, operation.id).await.unwrap());
    assert!(!store.tenant_override_disabled(globex, operation.id).await.unwrap());

    // An enabled override is not a deny.
    admin.set_override(acme, operation.id, true).await.unwrap();
    assert!(!store.tenant_override_disabled(acme, operation.id).await.unwrap());

    admin
        .block_user(acme, alice, operation.id, Some("abuse report"))
        .await
        .unwrap();
    assert!(store.user_blocked(acme, alice, operation.id).await.unwrap());
    assert!(!store.user_blocked(acme, bob, operation.id).await.unwrap());

    admin.unblock_user(acme, alice, operation.id).await.unwrap();
    assert!(!store.user_blocked(acme, alice, operation.id).await.unwrap());
}

#[tokio::test]
async fn users_resolve_by_id_and_username() {
    let pool = pool().await;
    let admin = PolicyAdmin::new(pool.clone());
    let tenant = admin.create_tenant("Acme").await.unwrap();
    let alice = admin.create_user(Some(tenant), "alice").await.unwrap();
    let operator = admin.create_user(None, "root").await.unwrap();

    let store = SqlxPolicyStore::new(pool);
    let by_name = store.user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, alice);
    assert_eq!(by_name.tenant_id, Some(tenant));

    let by_id = store.user_by_id(operator).await.unwrap().unwrap();
    assert_eq!(by_id.tenant_id, None);
    assert!(store.user_by_username("nobody").await.unwrap().is_none());
}
