//! Tracing setup and the panic-to-envelope layer.

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::error::DebugInfo;

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Panic handler that produces the shared 500 envelope instead of an
/// empty body. With `debug` on, the panic message is included.
#[derive(Debug, Clone, Copy)]
pub struct PanicEnvelope {
    debug: bool,
}

impl ResponseForPanic for PanicEnvelope {
    type ResponseBody = Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn std::any::Any + Send + 'static>,
    ) -> Response<Self::ResponseBody> {
        let message = if let Some(s) = err.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        tracing::error!(panic = %message, "handler panicked");

        let mut body = serde_json::json!({
            "error": "Internal Server Error",
            "detail": "An unexpected error occurred.",
            "status_code": 500,
        });
        if self.debug {
            let info = DebugInfo {
                exception_type: "panic".to_string(),
                exception_message: message,
            };
            body["debug"] = serde_json::to_value(&info).unwrap_or_default();
        }

        // Serializing a plain json! value cannot fail.
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .unwrap_or_default()
    }
}

/// A [`CatchPanicLayer`] wired to the shared error envelope.
pub fn catch_panic_layer(debug: bool) -> CatchPanicLayer<PanicEnvelope> {
    CatchPanicLayer::custom(PanicEnvelope { debug })
}
