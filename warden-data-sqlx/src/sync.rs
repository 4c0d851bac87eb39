//! Endpoint-catalog synchronizer.
//!
//! Reconciles the persisted `api_endpoints` / `api_operations` rows
//! with the application's route catalog. The whole run executes in
//! one transaction; a dry run performs the same work and rolls it
//! back, so the report always reflects exactly what a real run would
//! change. Re-running against an unchanged catalog is a no-op.

use sqlx::{Sqlite, SqlitePool, Transaction};

use warden_core::{default_action, normalize_path, RouteCatalog, StoreError, DEFAULT_BYPASS_PREFIXES};

/// Knobs for one synchronizer run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Plan and report, persist nothing.
    pub dry_run: bool,
    /// Skip re-normalizing paths already in the catalog.
    pub skip_paths: bool,
    /// Skip updating module/submodule ownership of existing endpoints.
    pub skip_modules: bool,
    /// Skip creating missing operations.
    pub skip_operations: bool,
    /// Routes whose normalized path starts with one of these prefixes
    /// are outside the authorization regime and never registered.
    pub skip_prefixes: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_paths: false,
            skip_modules: false,
            skip_operations: false,
            skip_prefixes: DEFAULT_BYPASS_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// One intended (or applied) change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncChange {
    PathCleaned {
        from: String,
        to: String,
    },
    EndpointCreated {
        path: String,
        module: String,
        submodule: Option<String>,
    },
    EndpointRemapped {
        path: String,
        from: String,
        to: String,
    },
    OperationCreated {
        path: String,
        method: String,
        action: Option<String>,
    },
    RouteSkipped {
        path: String,
    },
}

impl std::fmt::Display for SyncChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncChange::PathCleaned { from, to } => write!(f, "CLEAN {from} -> {to}"),
            SyncChange::EndpointCreated {
                path,
                module,
                submodule,
            } => match submodule {
                Some(sub) => write!(f, "ADD   {path} ({module}/{sub})"),
                None => write!(f, "ADD   {path} ({module})"),
            },
            SyncChange::EndpointRemapped { path, from, to } => {
                write!(f, "REMAP {path} {from} -> {to}")
            }
            SyncChange::OperationCreated {
                path,
                method,
                action,
            } => write!(
                f,
                "OP    {method} {path} -> {}",
                action.as_deref().unwrap_or("(none)")
            ),
            SyncChange::RouteSkipped { path } => write!(f, "SKIP  {path}"),
        }
    }
}

/// Outcome of a synchronizer run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub paths_cleaned: usize,
    pub endpoints_created: usize,
    pub endpoints_remapped: usize,
    pub operations_created: usize,
    pub routes_skipped: usize,
    pub dry_run: bool,
    pub changes: Vec<SyncChange>,
}

impl SyncReport {
    /// Number of writes the run performed (or would perform).
    pub fn total_changes(&self) -> usize {
        self.paths_cleaned + self.endpoints_created + self.endpoints_remapped
            + self.operations_created
    }
}

/// Reconcile the persisted endpoint catalog with `catalog`.
///
/// Fails with [`StoreError::Conflict`] when normalizing an existing
/// path would collide with another registered endpoint; that state
/// needs operator attention and nothing is persisted.
pub async fn sync_catalog(
    pool: &SqlitePool,
    catalog: &RouteCatalog,
    options: &SyncOptions,
) -> Result<SyncReport, StoreError> {
    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..SyncReport::default()
    };
    let mut tx = pool.begin().await.map_err(StoreError::database)?;

    if !options.skip_paths {
        clean_existing_paths(&mut tx, &mut report).await?;
    }

    for spec in catalog.entries() {
        let path = normalize_path(&spec.path);
        if options
            .skip_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()) || path == prefix.trim_end_matches('/'))
        {
            report.routes_skipped += 1;
            report.changes.push(SyncChange::RouteSkipped { path });
            continue;
        }

        let endpoint_id =
            reconcile_endpoint(&mut tx, &mut report, spec, &path, options.skip_modules).await?;

        if options.skip_operations {
            continue;
        }
        for method in &spec.methods {
            reconcile_operation(&mut tx, &mut report, spec, &path, endpoint_id, method).await?;
        }
    }

    if options.dry_run {
        tx.rollback().await.map_err(StoreError::database)?;
    } else {
        tx.commit().await.map_err(StoreError::database)?;
    }
    Ok(report)
}

/// Rewrite previously registered paths into canonical form, refusing
/// to merge two endpoints that normalize to the same path.
async fn clean_existing_paths(
    tx: &mut Transaction<'_, Sqlite>,
    report: &mut SyncReport,
) -> Result<(), StoreError> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, path FROM api_endpoints")
        .fetch_all(&mut **tx)
        .await
        .map_err(StoreError::database)?;

    for (id, path) in rows {
        let normalized = normalize_path(&path);
        if normalized == path {
            continue;
        }
        let occupied: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM api_endpoints WHERE path = ? AND id != ?)",
        )
        .bind(&normalized)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(StoreError::database)?;
        if occupied != 0 {
            return Err(StoreError::Conflict(format!(
                "normalizing '{path}' collides with registered endpoint '{normalized}'"
            )));
        }
        sqlx::query("UPDATE api_endpoints SET path = ? WHERE id = ?")
            .bind(&normalized)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(StoreError::database)?;
        report.paths_cleaned += 1;
        report.changes.push(SyncChange::PathCleaned {
            from: path,
            to: normalized,
        });
    }
    Ok(())
}

async fn reconcile_endpoint(
    tx: &mut Transaction<'_, Sqlite>,
    report: &mut SyncReport,
    spec: &warden_core::RouteSpec,
    path: &str,
    skip_modules: bool,
) -> Result<i64, StoreError> {
    let module = spec.effective_module();
    let existing: Option<(i64, String, Option<String>)> = sqlx::query_as(
        "SELECT id, module_code, submodule_code FROM api_endpoints WHERE path = ?",
    )
    .bind(path)
    .fetch_optional(&mut **tx)
    .await
    .map_err(StoreError::database)?;

    match existing {
        None => {
            ensure_module(tx, module).await?;
            if let Some(sub) = spec.submodule.as_deref() {
                ensure_submodule(tx, module, sub).await?;
            }
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO api_endpoints (path, module_code, submodule_code)
                 VALUES (?, ?, ?) RETURNING id",
            )
            .bind(path)
            .bind(module)
            .bind(spec.submodule.as_deref())
            .fetch_one(&mut **tx)
            .await
            .map_err(StoreError::database)?;
            report.endpoints_created += 1;
            report.changes.push(SyncChange::EndpointCreated {
                path: path.to_string(),
                module: module.to_string(),
                submodule: spec.submodule.clone(),
            });
            Ok(id)
        }
        Some((id, current_module, current_submodule)) => {
            let unchanged =
                current_module == module && current_submodule.as_deref() == spec.submodule.as_deref();
            if skip_modules || unchanged {
                return Ok(id);
            }
            ensure_module(tx, module).await?;
            if let Some(sub) = spec.submodule.as_deref() {
                ensure_submodule(tx, module, sub).await?;
            }
            sqlx::query(
                "UPDATE api_endpoints SET module_code = ?, submodule_code = ? WHERE id = ?",
            )
            .bind(module)
            .bind(spec.submodule.as_deref())
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(StoreError::database)?;
            report.endpoints_remapped += 1;
            report.changes.push(SyncChange::EndpointRemapped {
                path: path.to_string(),
                from: scope_label(&current_module, current_submodule.as_deref()),
                to: scope_label(module, spec.submodule.as_deref()),
            });
            Ok(id)
        }
    }
}

/// Create the operation if missing. Existing rows keep their
/// `is_enabled` and `action_code` untouched: operators own those.
async fn reconcile_operation(
    tx: &mut Transaction<'_, Sqlite>,
    report: &mut SyncReport,
    spec: &warden_core::RouteSpec,
    path: &str,
    endpoint_id: i64,
    method: &str,
) -> Result<(), StoreError> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM api_operations WHERE endpoint_id = ? AND http_method = ?)",
    )
    .bind(endpoint_id)
    .bind(method)
    .fetch_one(&mut **tx)
    .await
    .map_err(StoreError::database)?;
    if exists != 0 {
        return Ok(());
    }

    let action = spec
        .action
        .clone()
        .or_else(|| default_action(method).map(str::to_string));
    if let Some(code) = action.as_deref() {
        ensure_action(tx, code).await?;
    }
    sqlx::query(
        "INSERT INTO api_operations (endpoint_id, http_method, action_code) VALUES (?, ?, ?)",
    )
    .bind(endpoint_id)
    .bind(method)
    .bind(action.as_deref())
    .execute(&mut **tx)
    .await
    .map_err(StoreError::database)?;
    report.operations_created += 1;
    report.changes.push(SyncChange::OperationCreated {
        path: path.to_string(),
        method: method.to_string(),
        action,
    });
    Ok(())
}

async fn ensure_module(tx: &mut Transaction<'_, Sqlite>, code: &str) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO modules (code, name) VALUES (?, ?) ON CONFLICT(code) DO NOTHING")
        .bind(code)
        .bind(code)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::database)?;
    Ok(())
}

async fn ensure_submodule(
    tx: &mut Transaction<'_, Sqlite>,
    module: &str,
    code: &str,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO submodules (code, name) VALUES (?, ?) ON CONFLICT(code) DO NOTHING")
        .bind(code)
        .bind(code)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::database)?;
    sqlx::query(
        "INSERT INTO module_submodules (module_code, submodule_code) VALUES (?, ?)
         ON CONFLICT DO NOTHING",
    )
    .bind(module)
    .bind(code)
    .execute(&mut **tx)
    .await
    .map_err(StoreError::database)?;
    Ok(())
}

async fn ensure_action(tx: &mut Transaction<'_, Sqlite>, code: &str) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO actions (code, description) VALUES (?, '') ON CONFLICT(code) DO NOTHING")
        .bind(code)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::database)?;
    Ok(())
}

fn scope_label(module: &str, submodule: Option<&str>) -> String {
    match submodule {
        Some(sub) => format!("{module}/{sub}"),
        None => module.to_string(),
    }
}
