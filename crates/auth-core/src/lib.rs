//! # auth-core
//!
//! Domain layer containing the user entity, the credential store port, and domain errors.
//! This crate has zero dependencies on infrastructure (database, message bus, etc.).

pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{NewUser, PublicUser, User};
pub use error::DomainError;
pub use traits::{RepoResult, UserRepository};
