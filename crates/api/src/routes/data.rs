//! Route definitions for the `/data` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// Routes mounted at `/api/data`. All require `X-API-KEY`.
///
/// ```text
/// GET /{field}/{id}/latest  -> latest
/// GET /{field}/{id}/range   -> range (?from=&to=&interval=)
/// GET /{*rest}              -> 400 for any other shape
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{field}/{id}/latest", get(data::latest))
        .route("/{field}/{id}/range", get(data::range))
        .route("/{*rest}", get(data::malformed))
}
