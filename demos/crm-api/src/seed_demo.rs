//! Demo policy data: one tenant, a Viewer and an Editor role, and a
//! user for each, matching the walkthrough in the crate docs.

use sqlx::SqlitePool;

use warden::prelude::{PolicyAdmin, StoreError};

pub async fn run(pool: &SqlitePool) -> Result<(), StoreError> {
    let admin = PolicyAdmin::new(pool.clone());
    admin.seed_base().await?;
    admin.upsert_module("CRM", "Customer Relationship Management").await?;
    admin.upsert_submodule("LEADS", "Leads").await?;
    admin.map_submodule("CRM", "LEADS").await?;

    let tenant = admin.create_tenant("TestTenant").await?;
    let subscription = admin.subscribe(tenant, "CRM", Some("LEADS")).await?;

    let view = admin.define_permission(tenant, subscription, "view").await?;
    let create = admin.define_permission(tenant, subscription, "create").await?;
    let update = admin.define_permission(tenant, subscription, "update").await?;

    let viewer_role = admin.create_role(tenant, "Viewer").await?;
    admin.grant(viewer_role, view, true).await?;

    let editor_role = admin.create_role(tenant, "Editor").await?;
    admin.grant(editor_role, view, true).await?;
    admin.grant(editor_role, create, true).await?;
    admin.grant(editor_role, update, true).await?;

    let viewer = admin.create_user(Some(tenant), "viewer_a").await?;
    admin.assign_role(viewer, viewer_role).await?;
    let editor = admin.create_user(Some(tenant), "editor_a").await?;
    admin.assign_role(editor, editor_role).await?;

    println!("Demo policy seeded. Try:");
    println!();
    println!("  curl -H 'X-User: viewer_a' http://127.0.0.1:8080/api/enquiries");
    println!("  curl -H 'X-User: viewer_a' -X POST http://127.0.0.1:8080/api/enquiries \\");
    println!("       -H 'Content-Type: application/json' -d '{{\"subject\":\"demo\"}}'   # 403");
    println!("  curl -H 'X-User: editor_a' -X POST http://127.0.0.1:8080/api/enquiries \\");
    println!("       -H 'Content-Type: application/json' -d '{{\"subject\":\"demo\"}}'   # 201");
    Ok(())
}
