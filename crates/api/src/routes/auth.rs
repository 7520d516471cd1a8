//! Route definitions for token issuance and checks.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/api`.
///
/// ```text
/// POST /authorize   -> authorize (public)
/// GET  /checkToken  -> check_token (X-API-KEY)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/authorize", post(auth::authorize))
        .route("/checkToken", get(auth::check_token))
}
