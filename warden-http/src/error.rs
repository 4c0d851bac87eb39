//! The structured error contract.
//!
//! Every error body shares one envelope:
//!
//! ```json
//! {
//!   "error":       "Unauthorized Access",
//!   "violation":   "permission_denied",
//!   "detail":      "user 'viewer_a' lacks 'create' on CRM/LEADS",
//!   "status_code": 403,
//!   "path":        "/api/enquiries"
//! }
//! ```
//!
//! Denials carry the violation kind; 404/400/500 reuse the envelope
//! without one. In debug mode, 500 bodies additionally include the
//! exception kind and message; in production only the path remains
//! as correlation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use warden_core::{Denial, StoreError};

/// Debug payload attached to 500 envelopes when debug mode is on.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub exception_type: String,
    pub exception_message: String,
}

/// Error type returned by Warden-guarded handlers and by the
/// authorization middleware itself.
#[derive(Debug)]
pub enum ApiError {
    NotFound {
        message: String,
        path: Option<String>,
    },
    Validation {
        message: String,
        path: Option<String>,
    },
    Denied {
        denial: Denial,
        path: String,
    },
    Internal {
        message: String,
        path: Option<String>,
        debug: Option<DebugInfo>,
    },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            path: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            path: None,
        }
    }

    pub fn denied(denial: Denial, path: impl Into<String>) -> Self {
        ApiError::Denied {
            denial,
            path: path.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            path: None,
            debug: None,
        }
    }

    /// Attach the request path for correlation.
    pub fn with_path(mut self, request_path: impl Into<String>) -> Self {
        let request_path = request_path.into();
        match &mut self {
            ApiError::NotFound { path, .. }
            | ApiError::Validation { path, .. }
            | ApiError::Internal { path, .. } => *path = Some(request_path),
            ApiError::Denied { path, .. } => *path = request_path,
        }
        self
    }

    /// Attach exception details, shown only on 500 bodies.
    pub fn with_debug(mut self, info: DebugInfo) -> Self {
        if let ApiError::Internal { debug, .. } = &mut self {
            *debug = Some(info);
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Denied { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    violation: Option<&'a str>,
    detail: &'a str,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<&'a DebugInfo>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::NotFound { message, path } => ErrorEnvelope {
                error: "Not Found",
                violation: None,
                detail: message,
                status_code: status.as_u16(),
                path: path.as_deref(),
                debug: None,
            },
            ApiError::Validation { message, path } => ErrorEnvelope {
                error: "Validation Error",
                violation: None,
                detail: message,
                status_code: status.as_u16(),
                path: path.as_deref(),
                debug: None,
            },
            ApiError::Denied { denial, path } => ErrorEnvelope {
                error: "Unauthorized Access",
                violation: Some(denial.violation.as_str()),
                detail: &denial.detail,
                status_code: status.as_u16(),
                path: Some(path),
                debug: None,
            },
            ApiError::Internal {
                message,
                path,
                debug,
            } => ErrorEnvelope {
                error: "Internal Server Error",
                violation: None,
                detail: message,
                status_code: status.as_u16(),
                path: path.as_deref(),
                debug: debug.as_ref(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound { message, .. } => write!(f, "Not Found: {message}"),
            ApiError::Validation { message, .. } => write!(f, "Validation Error: {message}"),
            ApiError::Denied { denial, .. } => write!(f, "Unauthorized Access: {denial}"),
            ApiError::Internal { message, .. } => write!(f, "Internal Error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use warden_core::Violation;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn denial_envelope_is_complete() {
        let denial = Denial::new(Violation::PermissionDenied, "user 'a' lacks 'view' on CRM");
        let (status, json) = body_json(ApiError::denied(denial, "/api/enquiries")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "Unauthorized Access");
        assert_eq!(json["violation"], "permission_denied");
        assert_eq!(json["detail"], "user 'a' lacks 'view' on CRM");
        assert_eq!(json["status_code"], 403);
        assert_eq!(json["path"], "/api/enquiries");
    }

    #[tokio::test]
    async fn not_found_shares_the_envelope_without_violation() {
        let (status, json) =
            body_json(ApiError::not_found("enquiry 42 does not exist").with_path("/api/enquiries/42"))
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["status_code"], 404);
        assert_eq!(json["path"], "/api/enquiries/42");
        assert!(json.get("violation").is_none());
    }

    #[tokio::test]
    async fn internal_error_hides_details_unless_debug() {
        let (status, json) = body_json(ApiError::internal("boom")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json.get("debug").is_none());

        let (_, json) = body_json(ApiError::internal("boom").with_debug(DebugInfo {
            exception_type: "StoreError".into(),
            exception_message: "boom".into(),
        }))
        .await;
        assert_eq!(json["debug"]["exception_type"], "StoreError");
    }
}
