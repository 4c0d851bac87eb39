use serde::{Deserialize, Serialize};

/// Machine-readable key describing which policy rule denied a request.
///
/// The wire strings are stable: clients and alerting rules branch on
/// them, so renaming a variant is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    ApiNotRegistered,
    ApiDisabledGlobally,
    TenantNotSubscribed,
    ModuleDisabledForTenant,
    TenantSubscriptionExpired,
    ApiDisabledForTenant,
    ApiBlockedForUser,
    UnknownActionMapping,
    PermissionDenied,
}

impl Violation {
    /// The stable wire string for this violation kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Violation::ApiNotRegistered => "api_not_registered",
            Violation::ApiDisabledGlobally => "api_disabled_globally",
            Violation::TenantNotSubscribed => "tenant_not_subscribed",
            Violation::ModuleDisabledForTenant => "module_disabled_for_tenant",
            Violation::TenantSubscriptionExpired => "tenant_subscription_expired",
            Violation::ApiDisabledForTenant => "api_disabled_for_tenant",
            Violation::ApiBlockedForUser => "api_blocked_for_user",
            Violation::UnknownActionMapping => "unknown_action_mapping",
            Violation::PermissionDenied => "permission_denied",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured denial: which rule fired, and a human-readable
/// sentence explaining exactly what was violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub violation: Violation,
    pub detail: String,
}

impl Denial {
    pub fn new(violation: Violation, detail: impl Into<String>) -> Self {
        Self {
            violation,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.violation, self.detail)
    }
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

impl Verdict {
    pub fn deny(violation: Violation, detail: impl Into<String>) -> Self {
        Verdict::Deny(Denial::new(violation, detail))
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    /// The denial, if this verdict is one.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny(denial) => Some(denial),
        }
    }
}
