use colored::Colorize;

use warden_core::{normalize_path, RouteCatalog};

/// Print the registered catalog, one line per `(method, path)`.
pub fn run(catalog: &RouteCatalog) {
    if catalog.is_empty() {
        println!("{}", "No routes registered.".dimmed());
        return;
    }

    let mut rows: Vec<(String, String, String, String)> = Vec::new();
    for spec in catalog.entries() {
        let path = normalize_path(&spec.path);
        let scope = match &spec.submodule {
            Some(sub) => format!("{}/{}", spec.effective_module(), sub),
            None => spec.effective_module().to_string(),
        };
        for method in &spec.methods {
            rows.push((method.clone(), path.clone(), spec.handler.clone(), scope.clone()));
        }
    }
    rows.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    println!("{}", "Registered routes:".bold());
    println!();
    println!(
        "  {:<8} {:<40} {:<30} {}",
        "METHOD".dimmed(),
        "PATH".dimmed(),
        "HANDLER".dimmed(),
        "MODULE".dimmed()
    );
    println!("  {}", "-".repeat(90).dimmed());

    for (method, path, handler, scope) in &rows {
        let method_colored = match method.as_str() {
            "GET" => method.green(),
            "POST" => method.blue(),
            "PUT" => method.yellow(),
            "DELETE" => method.red(),
            "PATCH" => method.magenta(),
            _ => method.normal(),
        };
        println!("  {method_colored:<8} {path:<40} {handler:<30} {scope}");
    }

    println!();
    println!("  {} operations total", rows.len());
}
