use colored::Colorize;
use sqlx::SqlitePool;

use warden_data_sqlx::PolicyAdmin;

/// Seed the base action vocabulary and the sentinel module.
pub async fn run(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await?;
    for (code, description) in warden_data_sqlx::admin::BASE_ACTIONS {
        println!("  {} {code:<10} {description}", "✓".green());
    }
    println!();
    println!("{}", "Base policy vocabulary seeded.".green());
    Ok(())
}
