//! Handlers for token issuance and token checks.
//!
//! These two endpoints keep their own response shapes (`{"ok", "token"}`
//! and `{"ok"}`) for every status, instead of the error envelope used by
//! the data routes.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::auth::api_key_from_headers;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/authorize`.
#[derive(Debug, Deserialize, Validate)]
pub struct AuthorizeRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response body for `POST /api/authorize`.
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub ok: bool,
    pub token: String,
}

impl AuthorizeResponse {
    fn denied(status: StatusCode) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                ok: false,
                token: String::new(),
            }),
        )
    }
}

/// Response body for `GET /api/checkToken`.
#[derive(Debug, Serialize)]
pub struct CheckTokenResponse {
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/authorize
///
/// Exchange a username and password for a bearer token with the default
/// lifetime.
pub async fn authorize(
    State(state): State<AppState>,
    payload: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> (StatusCode, Json<AuthorizeResponse>) {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected authorize body");
            return AuthorizeResponse::denied(StatusCode::BAD_REQUEST);
        }
    };

    if let Err(e) = input.validate() {
        tracing::debug!(error = %e, "Invalid authorize body");
        return AuthorizeResponse::denied(StatusCode::BAD_REQUEST);
    }

    if !state.auth.authorise(&input.username, &input.password).await {
        tracing::info!(username = %input.username, "Authorization denied");
        return AuthorizeResponse::denied(StatusCode::UNAUTHORIZED);
    }

    match state.auth.issue_token(Duration::ZERO).await {
        Ok(token) => {
            tracing::info!(username = %input.username, "Authorization granted");
            (
                StatusCode::OK,
                Json(AuthorizeResponse {
                    ok: true,
                    token: token.token,
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Token issuance failed");
            AuthorizeResponse::denied(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/checkToken
///
/// Report whether the `X-API-KEY` token is currently valid.
pub async fn check_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<CheckTokenResponse>) {
    let valid = match api_key_from_headers(&headers) {
        Some(token) => state.auth.validate_token(token).await,
        None => false,
    };

    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(CheckTokenResponse { ok: valid }))
}
