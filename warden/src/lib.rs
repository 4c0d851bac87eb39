//! Warden — multi-tenant RBAC authorization for axum services.
//!
//! This facade crate re-exports the Warden sub-crates through a
//! single dependency. Import everything you need with:
//!
//! ```ignore
//! use warden::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate              |
//! |-------------|---------|--------------------|
//! | `data-sqlx` | **yes** | `warden-data-sqlx` |
//! | `cli`       | **yes** | `warden-cli`       |

pub extern crate warden_core;
pub extern crate warden_http;

#[cfg(feature = "data-sqlx")]
pub use warden_data_sqlx;

#[cfg(feature = "cli")]
pub use warden_cli;

// Re-export everything from warden-core at the top level.
pub use warden_core::*;

pub use warden_http::{
    authorize, catch_panic_layer, init_tracing, ApiError, AuthzState, Principal, TenantContext,
};

/// One-stop imports for applications wiring Warden up.
pub mod prelude {
    pub use warden_core::{
        DecisionEngine, MemoryPolicyStore, PolicyStore, RouteCatalog, RouteSpec, StoreError,
        Subject, TenantId, UserId, Verdict, Violation, WardenConfig,
    };
    pub use warden_http::{
        authorize, catch_panic_layer, init_tracing, ApiError, AuthzState, Principal, TenantContext,
    };

    #[cfg(feature = "data-sqlx")]
    pub use warden_data_sqlx::{ensure_schema, PolicyAdmin, SqlxPolicyStore, SyncOptions};
}
