//! Authentication extractors.
//!
//! - [`auth::ApiKey`] -- requires a valid token in the `X-API-KEY` header.

pub mod auth;
