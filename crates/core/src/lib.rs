//! Domain types shared by the gateway crates.
//!
//! - [`measurement`] -- the typed measurement model returned by the data API.
//! - [`record`] -- weakly-typed records as they come out of the time-series store.
//! - [`decode`] -- record to measurement conversion.
//! - [`duration`] -- token lifetime parsing for the admin tools.

pub mod decode;
pub mod duration;
pub mod error;
pub mod measurement;
pub mod record;
pub mod types;
