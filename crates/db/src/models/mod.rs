//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the table and, where
//! inserts take more than a couple of values, a create DTO.

pub mod credential;
pub mod token;
