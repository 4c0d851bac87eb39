//! The request interceptor.
//!
//! Runs once per inbound request, after authentication and before
//! any business handler:
//!
//! 1. infrastructure bypass: configured prefixes pass through
//!    untouched;
//! 2. anonymous pass-through: no [`Principal`] attached means the
//!    authentication layer owns enforcement;
//! 3. resolve the API operation and evaluate the policy layers;
//! 4. denials stop the request with the structured 403 envelope,
//!    logged at WARN; store failures surface as 500, logged at ERROR;
//! 5. allowed requests run inside the tenant-context scope, which is
//!    dropped on every exit path.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use warden_core::config::AuthzSettings;
use warden_core::{DecisionEngine, PolicyStore, Verdict};

use crate::context::TenantContext;
use crate::error::{ApiError, DebugInfo};
use crate::principal::Principal;

/// Shared state for the [`authorize`] middleware.
#[derive(Clone)]
pub struct AuthzState {
    store: Arc<dyn PolicyStore>,
    engine: DecisionEngine,
    bypass_prefixes: Arc<[String]>,
    debug_errors: bool,
}

impl AuthzState {
    pub fn new(store: Arc<dyn PolicyStore>, settings: &AuthzSettings) -> Self {
        Self {
            store,
            engine: DecisionEngine::new(),
            bypass_prefixes: settings.bypass_prefixes.clone().into(),
            debug_errors: settings.debug_errors,
        }
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    fn is_bypass(&self, path: &str) -> bool {
        self.bypass_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()) || path == prefix.trim_end_matches('/'))
    }
}

/// Authorization middleware; install with
/// `axum::middleware::from_fn_with_state(authz, authorize)` outside
/// the authentication layer.
pub async fn authorize(
    State(authz): State<AuthzState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let principal = request.extensions().get::<Principal>().cloned();

    if authz.is_bypass(&path) {
        // Outside the authorization regime, but downstream code still
        // gets the caller's tenant bound when one is known.
        let tenant = principal.and_then(|p| p.tenant_id);
        return TenantContext::scope(tenant, next.run(request)).await;
    }

    let Some(principal) = principal else {
        // Anonymous: the authentication layer handles its own
        // enforcement, and the tenant context stays unset.
        return next.run(request).await;
    };

    let method = request.method().as_str().to_uppercase();
    let subject = principal.subject();
    match authz
        .engine
        .evaluate(&*authz.store, &subject, &method, &path)
        .await
    {
        Ok(Verdict::Allow) => TenantContext::scope(principal.tenant_id, next.run(request)).await,
        Ok(Verdict::Deny(denial)) => {
            tracing::warn!(
                violation = %denial.violation,
                %method,
                %path,
                user = %principal.username,
                detail = %denial.detail,
                "request denied"
            );
            ApiError::denied(denial, path).into_response()
        }
        Err(err) => {
            tracing::error!(%method, %path, error = %err, "policy evaluation failed");
            let mut api_err = ApiError::internal("policy evaluation failed").with_path(path);
            if authz.debug_errors {
                api_err = api_err.with_debug(DebugInfo {
                    exception_type: "StoreError".to_string(),
                    exception_message: err.to_string(),
                });
            }
            api_err.into_response()
        }
    }
}
