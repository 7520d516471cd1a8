pub mod auth;
pub mod data;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /authorize                       POST  token for username + password
/// /checkToken                      GET   token validity
/// /data/{field}/{id}/latest        GET   newest sample in the last 24 h
/// /data/{field}/{id}/range         GET   windowed means over [from, to)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/data", data::router())
}
