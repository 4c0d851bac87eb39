//! Admin command-line surface for Warden-guarded applications.
//!
//! The CLI is embeddable rather than standalone: the endpoint
//! synchronizer needs the application's route catalog, which only
//! exists at wire-up time. Applications parse [`Cli`] from their own
//! `main` and delegate to [`run`]:
//!
//! ```ignore
//! let cli = warden_cli::Cli::parse();
//! warden_cli::run(cli.command, &catalog, &pool).await?;
//! ```

pub mod commands;

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use warden_core::RouteCatalog;

#[derive(Debug, Parser)]
#[command(
    name = "warden",
    version,
    about = "Warden admin CLI — endpoint catalog sync and policy seeding"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile the persisted endpoint catalog with the registered routes
    Sync {
        /// Report intended changes without persisting anything
        #[arg(long)]
        dry_run: bool,
        /// Skip re-normalizing paths already in the catalog
        #[arg(long)]
        skip_paths: bool,
        /// Skip updating module/submodule ownership of existing endpoints
        #[arg(long)]
        skip_modules: bool,
        /// Skip creating missing operations
        #[arg(long)]
        skip_operations: bool,
    },
    /// Seed the base action vocabulary and the sentinel module
    Seed,
    /// List the routes registered in the catalog
    Routes,
}

/// Execute a parsed command against the application's catalog and
/// policy database. Returns an error (non-zero exit for binaries) on
/// unreconcilable state.
pub async fn run(
    command: Command,
    catalog: &RouteCatalog,
    pool: &SqlitePool,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Sync {
            dry_run,
            skip_paths,
            skip_modules,
            skip_operations,
        } => {
            commands::sync::run(
                catalog,
                pool,
                warden_data_sqlx::SyncOptions {
                    dry_run,
                    skip_paths,
                    skip_modules,
                    skip_operations,
                    ..warden_data_sqlx::SyncOptions::default()
                },
            )
            .await
        }
        Command::Seed => commands::seed::run(pool).await,
        Command::Routes => {
            commands::routes::run(catalog);
            Ok(())
        }
    }
}
