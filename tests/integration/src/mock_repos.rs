//! In-memory credential store for tests that should not need Postgres

use async_trait::async_trait;
use auth_core::error::DomainError;
use auth_core::traits::{RepoResult, UserRepository};
use auth_core::{NewUser, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory user repository keyed by email
///
/// The entry API makes the uniqueness check and the insert one step, so two
/// concurrent creates for the same email cannot both succeed.
#[derive(Debug, Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<String, User>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Stored record for `email`, digest included
    pub fn get(&self, email: &str) -> Option<User> {
        self.users.get(email).map(|r| r.value().clone())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.get(email))
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DomainError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                let user = user.into_user();
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}
