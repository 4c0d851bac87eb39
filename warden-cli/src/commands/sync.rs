use colored::Colorize;
use sqlx::SqlitePool;

use warden_core::RouteCatalog;
use warden_data_sqlx::{sync_catalog, SyncOptions};

/// Run the endpoint-catalog synchronizer and print the change report.
pub async fn run(
    catalog: &RouteCatalog,
    pool: &SqlitePool,
    options: SyncOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if options.dry_run {
        println!("{}", "Dry run — no changes will be saved.".yellow());
        println!();
    }

    let report = sync_catalog(pool, catalog, &options).await?;

    for change in &report.changes {
        println!("  {change}");
    }
    if !report.changes.is_empty() {
        println!();
    }

    println!("  Paths cleaned:      {}", report.paths_cleaned);
    println!("  Endpoints created:  {}", report.endpoints_created);
    println!("  Endpoints remapped: {}", report.endpoints_remapped);
    println!("  Operations created: {}", report.operations_created);
    println!("  Routes skipped:     {}", report.routes_skipped);
    println!();

    if report.dry_run {
        println!("{}", "Dry run completed — nothing was saved.".yellow());
    } else if report.total_changes() == 0 {
        println!("{}", "Catalog already up to date.".green());
    } else {
        println!(
            "{}",
            format!("Sync completed | {} changes applied", report.total_changes()).green()
        );
    }
    Ok(())
}
