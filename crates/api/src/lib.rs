//! Sensorgate HTTP gateway library.
//!
//! Exposes the building blocks (config, state, auth, error handling, routes)
//! so integration tests, the admin tools and the binary entrypoint can all
//! reach them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
