//! Subject definitions.
//!
//! Defines the channel naming conventions for requests and replies.

use uuid::Uuid;

/// Subject for registration requests
pub const REGISTER_SUBJECT: &str = "auth.register";
/// Subject for login requests
pub const LOGIN_SUBJECT: &str = "auth.login";
/// Subject for token verification requests
pub const VERIFY_SUBJECT: &str = "auth.verify";
/// Prefix of per-client reply channels
pub const INBOX_PREFIX: &str = "_INBOX.";

/// Bus subjects
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// Create a user and issue a token
    Register,
    /// Check credentials and issue a token
    Login,
    /// Check a token and issue a fresh one
    Verify,
    /// Reply channel owned by one client
    Inbox(String),
    /// Any other channel name
    Custom(String),
}

impl Subject {
    /// Subjects the credential service answers on
    pub const REQUESTS: [Subject; 3] = [Subject::Register, Subject::Login, Subject::Verify];

    /// Create an inbox with a fresh random name
    #[must_use]
    pub fn new_inbox() -> Self {
        Self::Inbox(Uuid::new_v4().simple().to_string())
    }

    /// Create a custom subject
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Register => REGISTER_SUBJECT.to_string(),
            Self::Login => LOGIN_SUBJECT.to_string(),
            Self::Verify => VERIFY_SUBJECT.to_string(),
            Self::Inbox(id) => format!("{INBOX_PREFIX}{id}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `Subject`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            REGISTER_SUBJECT => Self::Register,
            LOGIN_SUBJECT => Self::Login,
            VERIFY_SUBJECT => Self::Verify,
            _ => match name.strip_prefix(INBOX_PREFIX) {
                Some(id) if !id.is_empty() => Self::Inbox(id.to_string()),
                _ => Self::Custom(name.to_string()),
            },
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
