//! Header-stub authentication.
//!
//! Real deployments authenticate upstream (JWT, session, gateway) and
//! attach a [`Principal`]; this demo trusts an `X-User` header so the
//! authorization layers can be exercised with plain curl.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use warden::prelude::{PolicyStore, Principal};

use crate::state::AppState;

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let username = request
        .headers()
        .get("x-user")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    if let Some(username) = username {
        match state.store.user_by_username(&username).await {
            Ok(Some(user)) if user.is_active => {
                request.extensions_mut().insert(Principal::from(&user));
            }
            Ok(_) => {}
            Err(err) => tracing::error!(%err, "user lookup failed"),
        }
    }
    next.run(request).await
}
