//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::{NewUser, User};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

/// Credential store capability
///
/// Email uniqueness is the store's responsibility: `create` must fail with
/// [`DomainError::EmailAlreadyExists`] when the email is taken, even if a
/// concurrent caller passed the same pre-check.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Insert a new user and return the stored record
    async fn create(&self, user: NewUser) -> RepoResult<User>;
}
