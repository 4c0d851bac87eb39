//! Warden core — the policy model and decision engine for a
//! multi-tenant RBAC service.
//!
//! This crate is framework-free: it defines the persisted policy
//! entities, the [`PolicyStore`] read contract, the endpoint
//! [`resolver`], and the seven-layer [`DecisionEngine`] that turns a
//! `(user, tenant, method, path)` request into an [`Verdict`].
//!
//! HTTP integration lives in `warden-http`, persistence in
//! `warden-data-sqlx`.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod store;
pub mod violation;

pub use catalog::{CatalogScope, RouteCatalog, RouteSpec, SYSTEM_MODULE};
pub use config::{ConfigError, WardenConfig, DEFAULT_BYPASS_PREFIXES};
pub use engine::DecisionEngine;
pub use model::{
    default_action, Action, ApiEndpoint, ApiOperation, EndpointId, Module, OperationId,
    Permission, PermissionId, PermissionTuple, Role, RoleId, SubModule, Subject, Tenant,
    TenantId, TenantModule, TenantModuleId, User, UserId,
};
pub use normalize::normalize_path;
pub use resolver::{canonical_request_path, resolve_endpoint, resolve_operation, ResolvedOperation};
pub use store::{memory::MemoryPolicyStore, PolicyStore, StoreError};
pub use violation::{Denial, Verdict, Violation};
