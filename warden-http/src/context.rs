//! Per-request tenant context.
//!
//! A task-local binding set by the authorization middleware and read
//! by tenant-aware data access further down the call graph. The
//! contract:
//!
//! - written only by the middleware, at request entry;
//! - readable by any code executing within the request's task;
//! - cleared on every exit path, including panics (the binding lives
//!   only as long as the scoped future);
//! - when unset, tenant-scoped queries must return the empty set:
//!   [`TenantContext::current`] returns `None` and callers treat that
//!   as "no rows".

use std::future::Future;

use warden_core::TenantId;

tokio::task_local! {
    static CURRENT_TENANT: Option<TenantId>;
}

/// Accessor for the per-request tenant binding.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext;

impl TenantContext {
    /// Run `fut` with the tenant binding in place. The binding is
    /// dropped with the scope, whatever way the future exits.
    pub async fn scope<F>(tenant: Option<TenantId>, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TENANT.scope(tenant, fut).await
    }

    /// The tenant bound to the current task, if any.
    ///
    /// `None` both outside any scope and inside an anonymous
    /// request's scope; callers must not distinguish the two.
    pub fn current() -> Option<TenantId> {
        CURRENT_TENANT.try_with(|tenant| *tenant).ok().flatten()
    }
}
