//! Axum integration for Warden.
//!
//! The [`authorize`] middleware classifies every inbound request
//! (bypass / anonymous / authorized), resolves the API operation, and
//! evaluates the seven-layer policy. Denials become the structured
//! 403 envelope; allowed requests run with the per-request
//! [`TenantContext`] bound for downstream data access.

pub mod context;
pub mod error;
pub mod layers;
pub mod middleware;
pub mod principal;

pub use context::TenantContext;
pub use error::{ApiError, DebugInfo};
pub use layers::{catch_panic_layer, init_tracing};
pub use middleware::{authorize, AuthzState};
pub use principal::Principal;
