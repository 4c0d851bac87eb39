//! The seven-layer deny-wins policy evaluator.
//!
//! Layers run in a fixed order; the first failing layer produces the
//! verdict and later layers are never consulted. The engine holds no
//! state of its own: every call reads fresh rows from the policy
//! store, and concurrent evaluations of the same request against the
//! same data produce identical verdicts.

use chrono::NaiveDate;

use crate::model::{default_action, Subject};
use crate::resolver::{canonical_request_path, resolve_operation, ResolvedOperation};
use crate::store::{PolicyStore, StoreError};
use crate::violation::{Verdict, Violation};

/// Stateless policy evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the operation for `(method, path)` and evaluate the
    /// full policy for `subject`.
    ///
    /// Store failures propagate as errors; they are infrastructure
    /// problems, never denials.
    pub async fn evaluate(
        &self,
        store: &dyn PolicyStore,
        subject: &Subject,
        method: &str,
        path: &str,
    ) -> Result<Verdict, StoreError> {
        let method = method.to_uppercase();
        let path = canonical_request_path(path);
        let resolved = resolve_operation(store, &method, path).await?;
        self.decide(store, subject, &method, path, resolved.as_ref(), today())
            .await
    }

    /// Evaluate the policy layers against an already-resolved
    /// operation. `today` is injected so expiry checks are
    /// deterministic under test.
    pub async fn decide(
        &self,
        store: &dyn PolicyStore,
        subject: &Subject,
        method: &str,
        path: &str,
        resolved: Option<&ResolvedOperation>,
        today: NaiveDate,
    ) -> Result<Verdict, StoreError> {
        // L1: the operation must be registered.
        let Some(ResolvedOperation {
            endpoint,
            operation,
        }) = resolved
        else {
            return Ok(Verdict::deny(
                Violation::ApiNotRegistered,
                format!("no API operation registered for {method} {path}"),
            ));
        };

        // L2: platform-level disable switch.
        if !operation.is_enabled {
            return Ok(Verdict::deny(
                Violation::ApiDisabledGlobally,
                format!("operation {} {} is disabled platform-wide", method, endpoint.path),
            ));
        }

        // L3/L3a/L3b: tenant subscription. Principals without a tenant
        // (platform operators) have no subscription to check.
        if let Some(tenant) = subject.tenant_id {
            let subscription = store
                .tenant_module(
                    tenant,
                    &endpoint.module_code,
                    endpoint.submodule_code.as_deref(),
                )
                .await?;
            let Some(subscription) = subscription else {
                return Ok(Verdict::deny(
                    Violation::TenantNotSubscribed,
                    format!(
                        "tenant {tenant} is not subscribed to {}",
                        endpoint.scope()
                    ),
                ));
            };
            if !subscription.is_enabled {
                return Ok(Verdict::deny(
                    Violation::ModuleDisabledForTenant,
                    format!(
                        "module {} is disabled for tenant {tenant}",
                        endpoint.scope()
                    ),
                ));
            }
            if subscription.is_expired(today) {
                // is_expired is true only when the date is set.
                let expired_on = subscription
                    .expiration_date
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                return Ok(Verdict::deny(
                    Violation::TenantSubscriptionExpired,
                    format!(
                        "subscription to {} for tenant {tenant} expired on {expired_on}",
                        endpoint.scope()
                    ),
                ));
            }

            // L4: tenant-level per-operation override.
            if store.tenant_override_disabled(tenant, operation.id).await? {
                return Ok(Verdict::deny(
                    Violation::ApiDisabledForTenant,
                    format!(
                        "operation {} {} is disabled for tenant {tenant}",
                        method, endpoint.path
                    ),
                ));
            }

            // L5: per-user hard block, the highest-priority deny.
            if store
                .user_blocked(tenant, subject.user_id, operation.id)
                .await?
            {
                return Ok(Verdict::deny(
                    Violation::ApiBlockedForUser,
                    format!(
                        "user '{}' is blocked from {} {}",
                        subject.username, method, endpoint.path
                    ),
                ));
            }
        }

        // L6: an action code must be derivable.
        let action = match operation.action_code.as_deref() {
            Some(code) => code,
            None => match default_action(method) {
                Some(code) => code,
                None => {
                    return Ok(Verdict::deny(
                        Violation::UnknownActionMapping,
                        format!(
                            "no action mapping for HTTP method {method} on {}",
                            endpoint.path
                        ),
                    ));
                }
            },
        };

        // L7: role-resolved permission tuples. A module-wide grant
        // covers every submodule of the module.
        let tuples = match subject.tenant_id {
            Some(tenant) => store.permission_tuples(tenant, subject.user_id).await?,
            None => Default::default(),
        };
        let module_wide = (endpoint.module_code.clone(), None, action.to_string());
        if tuples.contains(&module_wide) {
            return Ok(Verdict::Allow);
        }
        if endpoint.submodule_code.is_some() {
            let specific = (
                endpoint.module_code.clone(),
                endpoint.submodule_code.clone(),
                action.to_string(),
            );
            if tuples.contains(&specific) {
                return Ok(Verdict::Allow);
            }
        }

        Ok(Verdict::deny(
            Violation::PermissionDenied,
            format!(
                "user '{}' lacks '{action}' on {}",
                subject.username,
                endpoint.scope()
            ),
        ))
    }
}

/// Today's date in UTC, the reference point for subscription expiry.
fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
