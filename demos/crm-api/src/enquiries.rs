//! Enquiry CRUD, a deliberately small consumer of the authorization
//! verdict. Every query scopes by the request's tenant context; with
//! no tenant bound, reads return the empty set.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use warden::prelude::{ApiError, TenantContext, TenantId};

use crate::state::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Enquiry {
    pub id: i64,
    pub tenant_id: i64,
    pub subject: String,
    pub customer_name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct EnquiryInput {
    pub subject: String,
    #[serde(default)]
    pub customer_name: String,
}

pub async fn ensure_table(pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS enquiries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id INTEGER NOT NULL,
            subject TEXT NOT NULL,
            customer_name TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'open'
        )",
    )
    .execute(pool)
    .await
    .map(|_| ())
}

fn current_tenant() -> Option<TenantId> {
    TenantContext::current()
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Enquiry>>, ApiError> {
    let Some(tenant) = current_tenant() else {
        return Ok(Json(Vec::new()));
    };
    let rows = sqlx::query_as::<_, Enquiry>(
        "SELECT id, tenant_id, subject, customer_name, status
         FROM enquiries WHERE tenant_id = ? ORDER BY id",
    )
    .bind(tenant.get())
    .fetch_all(&state.pool)
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<EnquiryInput>,
) -> Result<(StatusCode, Json<Enquiry>), ApiError> {
    let Some(tenant) = current_tenant() else {
        return Err(ApiError::validation("no tenant bound to this request"));
    };
    if input.subject.trim().is_empty() {
        return Err(ApiError::validation("subject must not be empty"));
    }
    let enquiry = sqlx::query_as::<_, Enquiry>(
        "INSERT INTO enquiries (tenant_id, subject, customer_name)
         VALUES (?, ?, ?)
         RETURNING id, tenant_id, subject, customer_name, status",
    )
    .bind(tenant.get())
    .bind(input.subject.trim())
    .bind(&input.customer_name)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(enquiry)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Enquiry>, ApiError> {
    let Some(tenant) = current_tenant() else {
        return Err(not_found(id));
    };
    let row = sqlx::query_as::<_, Enquiry>(
        "SELECT id, tenant_id, subject, customer_name, status
         FROM enquiries WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant.get())
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;
    row.map(Json).ok_or_else(|| not_found(id))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<EnquiryInput>,
) -> Result<Json<Enquiry>, ApiError> {
    let Some(tenant) = current_tenant() else {
        return Err(not_found(id));
    };
    let row = sqlx::query_as::<_, Enquiry>(
        "UPDATE enquiries SET subject = ?, customer_name = ?
         WHERE tenant_id = ? AND id = ?
         RETURNING id, tenant_id, subject, customer_name, status",
    )
    .bind(input.subject.trim())
    .bind(&input.customer_name)
    .bind(tenant.get())
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;
    row.map(Json).ok_or_else(|| not_found(id))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let Some(tenant) = current_tenant() else {
        return Err(not_found(id));
    };
    let result = sqlx::query("DELETE FROM enquiries WHERE tenant_id = ? AND id = ?")
        .bind(tenant.get())
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("enquiry {id} does not exist"))
}
