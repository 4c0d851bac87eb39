use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use warden::prelude::*;
use warden::warden_cli;
use warden::warden_data_sqlx::ensure_schema;

mod auth;
mod catalog;
mod enquiries;
mod seed_demo;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "crm-api", version, about = "Demo CRM API guarded by Warden")]
struct Cli {
    #[command(subcommand)]
    command: Option<AppCommand>,
}

#[derive(Subcommand)]
enum AppCommand {
    /// Run the HTTP server (the default)
    Serve,
    /// Seed the demo tenant, roles, and users
    SeedDemo,
    #[command(flatten)]
    Admin(warden_cli::Command),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = WardenConfig::load(None)?;
    let database = config.database();

    // In-memory SQLite needs a single shared connection; pooled
    // connections would each get their own empty database.
    let mut options = SqlitePoolOptions::new();
    if database.url.contains(":memory:") {
        options = options.max_connections(1);
    }
    let pool = options.connect(&database.url).await?;
    ensure_schema(&pool).await?;
    enquiries::ensure_table(&pool).await?;

    let catalog = catalog::build_catalog();

    match cli.command.unwrap_or(AppCommand::Serve) {
        AppCommand::Serve => serve(&config, pool, &catalog).await,
        AppCommand::SeedDemo => {
            seed_demo::run(&pool).await?;
            Ok(())
        }
        AppCommand::Admin(command) => warden_cli::run(command, &catalog, &pool).await,
    }
}

async fn serve(
    config: &WardenConfig,
    pool: SqlitePool,
    catalog: &RouteCatalog,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(pool);
    let settings = config.authz();
    let policy_store: Arc<dyn PolicyStore> = state.store.clone();
    let authz = AuthzState::new(policy_store, &settings);

    let app = Router::new()
        .route(
            "/api/enquiries",
            get(enquiries::list).post(enquiries::create),
        )
        .route(
            "/api/enquiries/{id}",
            get(enquiries::get_one)
                .put(enquiries::update)
                .delete(enquiries::remove),
        )
        .route("/healthz", get(|| async { "OK" }))
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(authz, authorize))
        .layer(axum::middleware::from_fn_with_state(
            state,
            auth::authenticate,
        ))
        .layer(catch_panic_layer(settings.debug_errors))
        .layer(TraceLayer::new_for_http());

    let bind = config.server().bind;
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, routes = catalog.len(), "crm-api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
