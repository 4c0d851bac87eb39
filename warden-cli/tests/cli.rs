use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;

use warden_cli::{Cli, Command};
use warden_core::{PolicyStore, RouteCatalog, RouteSpec};
use warden_data_sqlx::{ensure_schema, SqlxPolicyStore};

#[test]
fn sync_flags_parse() {
    let cli = Cli::try_parse_from([
        "warden",
        "sync",
        "--dry-run",
        "--skip-paths",
        "--skip-modules",
        "--skip-operations",
    ])
    .unwrap();
    match cli.command {
        Command::Sync {
            dry_run,
            skip_paths,
            skip_modules,
            skip_operations,
        } => {
            assert!(dry_run);
            assert!(skip_paths);
            assert!(skip_modules);
            assert!(skip_operations);
        }
        other => panic!("expected sync, got {other:?}"),
    }
}

#[test]
fn sync_flags_default_off() {
    let cli = Cli::try_parse_from(["warden", "sync"]).unwrap();
    match cli.command {
        Command::Sync {
            dry_run,
            skip_paths,
            skip_modules,
            skip_operations,
        } => {
            assert!(!dry_run);
            assert!(!skip_paths);
            assert!(!skip_modules);
            assert!(!skip_operations);
        }
        other => panic!("expected sync, got {other:?}"),
    }
}

#[test]
fn unknown_commands_are_rejected() {
    assert!(Cli::try_parse_from(["warden", "frobnicate"]).is_err());
}

#[tokio::test]
async fn sync_then_seed_end_to_end() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();

    let mut catalog = RouteCatalog::new();
    catalog.register(
        RouteSpec::new("/api/enquiries", &["GET", "POST"])
            .handler("enquiries::collection")
            .module("CRM")
            .submodule("LEADS"),
    );

    let cli = Cli::try_parse_from(["warden", "seed"]).unwrap();
    warden_cli::run(cli.command, &catalog, &pool).await.unwrap();

    let cli = Cli::try_parse_from(["warden", "sync"]).unwrap();
    warden_cli::run(cli.command, &catalog, &pool).await.unwrap();

    let store = SqlxPolicyStore::new(pool);
    let endpoint = store.endpoint_by_path("/api/enquiries").await.unwrap().unwrap();
    assert_eq!(endpoint.module_code, "CRM");
    assert!(store.operation(endpoint.id, "POST").await.unwrap().is_some());
}
