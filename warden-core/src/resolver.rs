//! Maps an inbound `(method, path)` to a registered API operation.
//!
//! Resolution is a pure read over the policy store: an exact match on
//! the canonical path first, then a deterministic scan over
//! parameterized templates. Safe to call from any number of tasks
//! concurrently.

use regex::Regex;

use crate::model::{ApiEndpoint, ApiOperation};
use crate::store::{PolicyStore, StoreError};

/// An endpoint together with the operation matched for the request's
/// HTTP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    pub endpoint: ApiEndpoint,
    pub operation: ApiOperation,
}

/// Canonical form of a request path: trailing slashes trimmed, except
/// for the root `/` itself.
pub fn canonical_request_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Compile a stored path template into an anchored matcher, replacing
/// each `{name}` placeholder with a single-segment wildcard.
fn template_regex(template: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(template.len() + 16);
    pattern.push('^');
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let (literal, tail) = rest.split_at(start);
        pattern.push_str(&regex::escape(literal));
        match tail.find('}') {
            Some(end) => {
                pattern.push_str("[^/]+");
                rest = &tail[end + 1..];
            }
            None => {
                // Unbalanced brace: treat the remainder literally.
                pattern.push_str(&regex::escape(tail));
                rest = "";
            }
        }
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    Regex::new(&pattern)
}

/// Length of the literal prefix of a template (everything before the
/// first placeholder). Used as the primary tie-breaker.
fn literal_prefix_len(template: &str) -> usize {
    template.find('{').unwrap_or(template.len())
}

fn template_matches(template: &str, path: &str) -> bool {
    if !template.contains('{') {
        return canonical_request_path(template) == path;
    }
    match template_regex(canonical_request_path(template)) {
        Ok(re) => re.is_match(path),
        Err(err) => {
            tracing::warn!(template, %err, "unmatchable endpoint template");
            false
        }
    }
}

/// Resolve the registered endpoint for a request path.
///
/// Exact canonical match wins; otherwise the first parameterized
/// template that matches, ties broken by longer literal prefix and
/// then lexicographic path order, so resolution is deterministic
/// regardless of registration order.
pub async fn resolve_endpoint(
    store: &dyn PolicyStore,
    path: &str,
) -> Result<Option<ApiEndpoint>, StoreError> {
    let path = canonical_request_path(path);

    if let Some(endpoint) = store.endpoint_by_path(path).await? {
        return Ok(Some(endpoint));
    }

    let mut candidates: Vec<ApiEndpoint> = store
        .endpoints()
        .await?
        .into_iter()
        .filter(|endpoint| template_matches(&endpoint.path, path))
        .collect();
    candidates.sort_by(|a, b| {
        literal_prefix_len(&b.path)
            .cmp(&literal_prefix_len(&a.path))
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(candidates.into_iter().next())
}

/// Resolve the `ApiOperation` for `(method, path)`.
///
/// Returns `None` when either no endpoint matches the path or the
/// matched endpoint has no operation for the method; the decision
/// engine turns that into an `api_not_registered` denial.
pub async fn resolve_operation(
    store: &dyn PolicyStore,
    method: &str,
    path: &str,
) -> Result<Option<ResolvedOperation>, StoreError> {
    let method = method.to_uppercase();
    let Some(endpoint) = resolve_endpoint(store, path).await? else {
        return Ok(None);
    };
    let Some(operation) = store.operation(endpoint.id, &method).await? else {
        return Ok(None);
    };
    Ok(Some(ResolvedOperation {
        endpoint,
        operation,
    }))
}
