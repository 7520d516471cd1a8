//! Repository layer.
//!
//! Each repository holds a clone of the pool handed to it at construction
//! and exposes async methods for one table.

pub mod credential_repo;
pub mod token_repo;

pub use credential_repo::CredentialRepo;
pub use token_repo::TokenRepo;
