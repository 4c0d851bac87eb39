use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use warden_core::{PolicyStore, RouteCatalog, RouteSpec, SYSTEM_MODULE};
use warden_data_sqlx::{ensure_schema, sync_catalog, PolicyAdmin, SqlxPolicyStore, SyncOptions};

async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}

fn demo_catalog() -> RouteCatalog {
    let mut catalog = RouteCatalog::new();
    let mut api = catalog.scope("/api");
    api.register(
        RouteSpec::new("/enquiries", &["GET", "POST"])
            .handler("enquiries::collection")
            .module("CRM")
            .submodule("LEADS"),
    );
    api.register(
        RouteSpec::new("/enquiries/{id}", &["GET", "PUT", "DELETE"])
            .handler("enquiries::item")
            .module("CRM")
            .submodule("LEADS"),
    );
    catalog.register(RouteSpec::new("/healthz", &["GET"]).handler("health"));
    catalog
}

#[tokio::test]
async fn first_run_registers_endpoints_and_operations() {
    let pool = pool().await;
    let catalog = demo_catalog();
    let report = sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.endpoints_created, 3);
    assert_eq!(report.operations_created, 6);
    assert_eq!(report.routes_skipped, 0);

    let store = SqlxPolicyStore::new(pool);
    let endpoint = store
        .endpoint_by_path("/api/enquiries/{id}")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(endpoint.module_code, "CRM");
    assert_eq!(endpoint.submodule_code.as_deref(), Some("LEADS"));

    // Derived actions follow the HTTP-method defaults.
    let put = store.operation(endpoint.id, "PUT").await.unwrap().unwrap();
    assert_eq!(put.action_code.as_deref(), Some("update"));

    // Routes without declared ownership land in the sentinel module.
    let health = store.endpoint_by_path("/healthz").await.unwrap().unwrap();
    assert_eq!(health.module_code, SYSTEM_MODULE);
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let pool = pool().await;
    let catalog = demo_catalog();
    sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();
    let second = sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(second.total_changes(), 0, "{:?}", second.changes);
}

#[tokio::test]
async fn dry_run_persists_nothing() {
    let pool = pool().await;
    let catalog = demo_catalog();
    let report = sync_catalog(
        &pool,
        &catalog,
        &SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();
    assert!(report.total_changes() > 0);

    let store = SqlxPolicyStore::new(pool.clone());
    assert!(store.endpoints().await.unwrap().is_empty());

    // A real run afterwards performs exactly the dry-run plan.
    let applied = sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(applied.total_changes(), report.total_changes());
}

#[tokio::test]
async fn raw_templates_are_normalized_on_registration() {
    let pool = pool().await;
    let mut catalog = RouteCatalog::new();
    catalog.register(
        RouteSpec::new("^api/enquiries/(?P<pk>[^/.]+)/$", &["GET"])
            .module("CRM")
            .submodule("LEADS"),
    );
    sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();

    let store = SqlxPolicyStore::new(pool);
    assert!(store
        .endpoint_by_path("/api/enquiries/{pk}")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn bypass_prefixed_routes_are_skipped() {
    let pool = pool().await;
    let mut catalog = RouteCatalog::new();
    catalog.register(RouteSpec::new("/admin/users", &["GET"]));
    catalog.register(RouteSpec::new("/static/app.css", &["GET"]));
    catalog.register(RouteSpec::new("/api/enquiries", &["GET"]).module("CRM"));

    let report = sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(report.routes_skipped, 2);
    assert_eq!(report.endpoints_created, 1);
}

#[tokio::test]
async fn remap_updates_ownership_unless_skipped() {
    let pool = pool().await;
    let mut initial = RouteCatalog::new();
    initial.register(RouteSpec::new("/api/organizations", &["GET"]));
    sync_catalog(&pool, &initial, &SyncOptions::default())
        .await
        .unwrap();

    let mut corrected = RouteCatalog::new();
    corrected.register(
        RouteSpec::new("/api/organizations", &["GET"])
            .module("CRM")
            .submodule("ORGS"),
    );

    let skipped = sync_catalog(
        &pool,
        &corrected,
        &SyncOptions {
            skip_modules: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(skipped.endpoints_remapped, 0);

    let applied = sync_catalog(&pool, &corrected, &SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(applied.endpoints_remapped, 1);

    let store = SqlxPolicyStore::new(pool);
    let endpoint = store
        .endpoint_by_path("/api/organizations")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(endpoint.module_code, "CRM");
    assert_eq!(endpoint.submodule_code.as_deref(), Some("ORGS"));
}

#[tokio::test]
async fn operator_owned_fields_survive_resync() {
    let pool = pool().await;
    let catalog = demo_catalog();
    sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();

    let store = SqlxPolicyStore::new(pool.clone());
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await.unwrap();
    let endpoint = store.endpoint_by_path("/api/enquiries").await.unwrap().unwrap();
    let get = store.operation(endpoint.id, "GET").await.unwrap().unwrap();
    admin.set_operation_enabled(get.id, false).await.unwrap();
    sqlx::query("UPDATE api_operations SET action_code = 'approve' WHERE id = ?")
        .bind(get.id.get())
        .execute(&pool)
        .await
        .unwrap();

    sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();

    let get = store.operation(endpoint.id, "GET").await.unwrap().unwrap();
    assert!(!get.is_enabled);
    assert_eq!(get.action_code.as_deref(), Some("approve"));
}

#[tokio::test]
async fn colliding_normalizations_are_unreconcilable() {
    let pool = pool().await;
    sqlx::query("INSERT INTO modules (code, name) VALUES ('CRM', 'CRM')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO api_endpoints (path, module_code) VALUES ('/api/enquiries', 'CRM'),
         ('api/enquiries/', 'CRM')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let err = sync_catalog(&pool, &RouteCatalog::new(), &SyncOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, warden_core::StoreError::Conflict(_)));

    // skip-paths defers the cleanup instead of failing.
    let report = sync_catalog(
        &pool,
        &RouteCatalog::new(),
        &SyncOptions {
            skip_paths: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(report.total_changes(), 0);
}

#[tokio::test]
async fn approve_action_comes_from_the_handler_declaration() {
    let pool = pool().await;
    let mut catalog = RouteCatalog::new();
    catalog.register(
        RouteSpec::new("/api/enquiries/{id}/approve", &["POST"])
            .module("CRM")
            .submodule("LEADS")
            .action("approve"),
    );
    sync_catalog(&pool, &catalog, &SyncOptions::default())
        .await
        .unwrap();

    let store = SqlxPolicyStore::new(pool);
    let endpoint = store
        .endpoint_by_path("/api/enquiries/{id}/approve")
        .await
        .unwrap()
        .unwrap();
    let post = store.operation(endpoint.id, "POST").await.unwrap().unwrap();
    assert_eq!(post.action_code.as_deref(), Some("approve"));
}
