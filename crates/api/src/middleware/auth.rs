//! `X-API-KEY` bearer token extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sensorgate_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the bearer token.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A request carrying a currently valid token in the `X-API-KEY` header.
///
/// Use this as the first extractor of any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(key: ApiKey) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

/// The raw `X-API-KEY` value, if present, valid UTF-8 and non-empty.
pub fn api_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = api_key_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing X-API-KEY header".into()))
        })?;

        if !state.auth.validate_token(token).await {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid or expired token".into(),
            )));
        }

        Ok(ApiKey(token.to_string()))
    }
}
